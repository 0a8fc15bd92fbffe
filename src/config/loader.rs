//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_PRIMARY_DOMAIN: &str = "GATEWAY_PRIMARY_DOMAIN";
pub const ENV_DEFAULT_TARGET: &str = "GATEWAY_DEFAULT_TARGET";
pub const ENV_CONTROL_PLANE_HOST: &str = "CONTROL_PLANE_HOST";
pub const ENV_CONTROL_PLANE_SECRET: &str = "CONTROL_PLANE_SECRET";
pub const ENV_CONTROL_PLANE_SCHEME: &str = "CONTROL_PLANE_SCHEME";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Defaults, then the file (if any), then process environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// Values are stripped of trailing CR/LF so secrets written with Windows
/// line endings still work. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim_end_matches(['\r', '\n']).to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(v) = get(ENV_PRIMARY_DOMAIN) {
        config.routing.primary_domain = v;
    }
    if let Some(v) = get(ENV_DEFAULT_TARGET) {
        config.routing.default_target = v;
    }
    if let Some(v) = get(ENV_CONTROL_PLANE_HOST) {
        config.control_plane.host = v;
    }
    if let Some(v) = get(ENV_CONTROL_PLANE_SECRET) {
        config.control_plane.secret = v;
    }
    if let Some(v) = get(ENV_CONTROL_PLANE_SCHEME) {
        config.control_plane.scheme = v;
    }
}

/// Validate the merged configuration, handing it back if it is usable.
pub fn finalize(config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_env_overrides_trim_line_endings() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CONTROL_PLANE_HOST, "cp.example.com\r\n"),
            (ENV_CONTROL_PLANE_SECRET, "token\n"),
            (ENV_CONTROL_PLANE_SCHEME, "ws"),
            (ENV_PRIMARY_DOMAIN, ""),
        ]);

        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.control_plane.host, "cp.example.com");
        assert_eq!(config.control_plane.secret, "token");
        assert_eq!(config.control_plane.scheme, "ws");
        // Empty values leave the existing setting alone.
        assert_eq!(config.routing.primary_domain, "localhost");
    }

    #[test]
    fn test_read_and_finalize_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [routing]
            primary_domain = "example.com"
            default_target = "http://origin:80"

            [control_plane]
            scheme = "ws"
            host = "127.0.0.1:7000"
            secret = "abc"
            "#
        )
        .unwrap();

        let config = finalize(read_config(file.path()).unwrap()).unwrap();
        assert_eq!(config.routing.primary_domain, "example.com");
        assert_eq!(config.control_plane.endpoint(), "ws://127.0.0.1:7000/router/abc");
    }

    #[test]
    fn test_finalize_rejects_incomplete_config() {
        // Control plane enabled by default but no host or secret.
        let err = finalize(GatewayConfig::default()).unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_file_and_bad_toml() {
        assert!(matches!(
            read_config(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[routing\nprimary_domain = 1").unwrap();
        assert!(matches!(read_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
