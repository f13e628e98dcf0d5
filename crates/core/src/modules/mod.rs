//! Built-in triage rule modules.
//!
//! Each module is a `TriageModule` implementation resolved from its own
//! config section. The execution pipeline treats them uniformly; only
//! the registries in `registry::build_registries` know which module
//! belongs where.

mod empty_report;
mod keep_private;
mod reopen_clarification;

pub use empty_report::EmptyReport;
pub use keep_private::KeepPrivate;
pub use reopen_clarification::ReopenClarification;
