use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides (`SHOWSYNC_SYNC__INTERVAL_HOURS=12`).
pub const ENV_PREFIX: &str = "SHOWSYNC_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[sync]
interval_hours = 2

[provider]
timeout_secs = 10
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.sync.interval_hours, 2.0);
        assert_eq!(config.provider.timeout_secs, 10);
    }

    #[test]
    fn test_load_config_from_str_malformed() {
        let result = load_config_from_str("[provider\nbase_url = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[provider]
timeout_secs = "soon"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/showsync.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[sync]
interval_hours = 8

[database]
path = "catalog.db"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.sync.interval_hours, 8.0);
        assert_eq!(config.database.path.to_str().unwrap(), "catalog.db");
    }

    #[test]
    fn test_load_config_file_with_unparsable_interval() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[sync]\ninterval_hours = \"six-ish\"").unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.sync.interval_hours, 6.0);
    }
}
