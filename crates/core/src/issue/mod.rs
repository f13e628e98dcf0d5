//! Domain representation of tracker issues.

mod convert;
mod timeframe;
mod types;

pub use convert::issue_from_raw;
pub use timeframe::Timeframe;
pub use types::*;
