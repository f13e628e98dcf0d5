use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
}

/// Tracker connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Base URL of the tracker instance (e.g., "https://bugs.example.com")
    pub url: String,
    /// Account email used for basic auth
    pub email: String,
    /// API token used for basic auth
    pub api_token: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Run scheduling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Seconds between consecutive runs
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

/// Debug logging toggles, resolved once at startup and read-only during a run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DebugConfig {
    /// Log the final JQL of every registry query
    #[serde(default)]
    pub log_query_jql: bool,
    /// Log the keys of all returned issues instead of just the count
    #[serde(default)]
    pub log_returned_issues: bool,
}

/// Per-module enablement and options. Unknown module names are rejected
/// at load time so a typoed section fails startup instead of silently
/// running with defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    #[serde(default)]
    pub empty_report: EmptyReportConfig,
    #[serde(default)]
    pub keep_private: KeepPrivateConfig,
    #[serde(default)]
    pub reopen_clarification: ReopenClarificationConfig,
}

/// Configuration for the empty-report module
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmptyReportConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Comment posted when resolving an empty report
    #[serde(default = "default_empty_report_message")]
    pub message: String,
    /// Resolution set on the staged transition
    #[serde(default = "default_incomplete_resolution")]
    pub resolution: String,
}

impl Default for EmptyReportConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            message: default_empty_report_message(),
            resolution: default_incomplete_resolution(),
        }
    }
}

fn default_empty_report_message() -> String {
    "This report does not contain enough information. \
     Please attach logs and a description of the problem."
        .to_string()
}

fn default_incomplete_resolution() -> String {
    "Incomplete".to_string()
}

/// Configuration for the keep-private module
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeepPrivateConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Label marking an issue that must stay private
    #[serde(default = "default_private_label")]
    pub label: String,
    /// Security level id applied to marked issues
    #[serde(default = "default_security_level")]
    pub security_level: String,
}

impl Default for KeepPrivateConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            label: default_private_label(),
            security_level: default_security_level(),
        }
    }
}

fn default_private_label() -> String {
    "staff-private".to_string()
}

fn default_security_level() -> String {
    "private".to_string()
}

/// Configuration for the reopen-clarification module
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReopenClarificationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Resolution name that marks an issue as waiting on its reporter
    #[serde(default = "default_awaiting_resolution")]
    pub awaiting_resolution: String,
}

impl Default for ReopenClarificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            awaiting_resolution: default_awaiting_resolution(),
        }
    }
}

fn default_awaiting_resolution() -> String {
    "Awaiting Response".to_string()
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_defaults() {
        let exec = ExecutionConfig::default();
        assert_eq!(exec.interval_secs, 60);
    }

    #[test]
    fn test_debug_defaults_off() {
        let debug = DebugConfig::default();
        assert!(!debug.log_query_jql);
        assert!(!debug.log_returned_issues);
    }

    #[test]
    fn test_modules_enabled_by_default() {
        let modules = ModulesConfig::default();
        assert!(modules.empty_report.enabled);
        assert!(modules.keep_private.enabled);
        assert!(modules.reopen_clarification.enabled);
    }

    #[test]
    fn test_tracker_timeout_default() {
        let toml = r#"
url = "https://bugs.example.com"
email = "bot@example.com"
api_token = "secret"
"#;
        let tracker: TrackerConfig = toml::from_str(toml).unwrap();
        assert_eq!(tracker.timeout_secs, 30);
    }
}
