//! Structured logging setup.
//!
//! Builds tracing filter directives from [`LoggingConfig`] and installs the
//! global subscriber in the configured format.

use crate::config::{LogFormat, LoggingConfig};

/// Build filter directives string from LoggingConfig.
///
/// Constructs a tracing filter string that includes the base log level and
/// any component-specific log levels.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tailorplane::config::LoggingConfig;
/// use tailorplane::logging::build_filter_directives;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("budget".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     component_levels: Some(component_levels),
///     ..LoggingConfig::default()
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,tailorplane::budget=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<(&String, &String)> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",tailorplane::{}={}", component, level));
        }
    }

    filter_str
}

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(build_filter_directives(config)));

    match config.format {
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .try_init();
        }
        LogFormat::Pretty => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_base_level_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn test_filter_directives_with_components() {
        let mut component_levels = HashMap::new();
        component_levels.insert("budget".to_string(), "debug".to_string());
        component_levels.insert("routing".to_string(), "warn".to_string());
        let config = LoggingConfig {
            level: "info".to_string(),
            component_levels: Some(component_levels),
            ..LoggingConfig::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "info,tailorplane::budget=debug,tailorplane::routing=warn"
        );
    }
}
