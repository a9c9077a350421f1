//! Configuration for the relsql CLI
//!
//! Loads configuration from:
//! 1. relsql.yaml (or the file named by `RELSQL_CONFIG`) - naming and output settings
//! 2. .env file - loaded into the environment before anything else
//!
//! Environment variables always override file values.

use relsql_translate::TranslateOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "relsql.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

/// How the translated command is printed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON written to stdout
    pub pretty: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,relsql=debug".to_string(),
            format: "pretty".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translator: TranslateOptions,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from `RELSQL_CONFIG`, else `relsql.yaml` if present, else defaults.
    ///
    /// A path named explicitly through `RELSQL_CONFIG` must exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("RELSQL_CONFIG") {
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).is_file() {
            return Self::load(DEFAULT_CONFIG_FILE);
        }

        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(prefix) = std::env::var("RELSQL_DERIVED_PREFIX") {
            self.translator.derived_table_prefix = prefix;
        }
        if let Ok(separator) = std::env::var("RELSQL_SUFFIX_SEPARATOR") {
            self.translator.suffix_separator = separator;
        }
        if let Ok(pretty) = std::env::var("RELSQL_PRETTY") {
            self.output.pretty = match pretty.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnvVar {
                        name: "RELSQL_PRETTY".to_string(),
                        value: pretty,
                    })
                }
            };
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
        Ok(())
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: [&str; 8] = [
        "RELSQL_CONFIG",
        "RELSQL_DERIVED_PREFIX",
        "RELSQL_SUFFIX_SEPARATOR",
        "RELSQL_PRETTY",
        "RUST_LOG",
        "LOG_FORMAT",
        "LOG_OUTPUT",
        "LOG_DIR",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_default_config() {
        clear_env();
        let config = Config::default();
        assert_eq!(config.translator.derived_table_prefix, "t");
        assert_eq!(config.translator.suffix_separator, "_");
        assert!(!config.output.pretty);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    #[serial]
    fn test_partial_file_keeps_defaults() {
        clear_env();
        let file = write_config(
            r#"
output:
  pretty: true
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert!(config.output.pretty);
        assert_eq!(config.translator.suffix_separator, "_");
        assert_eq!(config.logging.directory, "./logs");
    }

    #[test]
    #[serial]
    fn test_env_var_override() {
        clear_env();
        let file = write_config(
            r#"
translator:
  derived_table_prefix: "sub"
  suffix_separator: "_"
logging:
  level: "info"
  format: "pretty"
  output: "stderr"
  directory: "./logs"
"#,
        );
        std::env::set_var("RELSQL_SUFFIX_SEPARATOR", "__");
        std::env::set_var("LOG_FORMAT", "json");

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.translator.derived_table_prefix, "sub");
        assert_eq!(config.translator.suffix_separator, "__"); // Overridden
        assert_eq!(config.logging.format, "json"); // Overridden

        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_config_path() {
        clear_env();
        let file = write_config("translator:\n  derived_table_prefix: \"q\"\n");
        std::env::set_var("RELSQL_CONFIG", file.path());

        let config = Config::load_or_default().unwrap();
        assert_eq!(config.translator.derived_table_prefix, "q");

        std::env::set_var("RELSQL_CONFIG", file.path().with_extension("missing"));
        assert!(matches!(Config::load_or_default(), Err(ConfigError::Io { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_pretty_flag() {
        clear_env();
        std::env::set_var("RELSQL_PRETTY", "sometimes");

        let mut config = Config::default();
        assert!(matches!(
            config.apply_env_overrides(),
            Err(ConfigError::InvalidEnvVar { .. })
        ));

        clear_env();
    }
}
