use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;
pub mod source;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, LogFormat, LoggingConfig, SessionConfig, StoreConfig, METADATA_STORE_SECTION,
    RESULTS_STORE_SECTION, SESSION_SECTION,
};
pub use source::ConfigFile;

/// Prefix for environment overrides, e.g. `HARNESS__METADATA_STORE__URL`.
pub const ENV_PREFIX: &str = "HARNESS";

/// Loads the application configuration from a TOML file.
///
/// Values from `HARNESS__<SECTION>__<KEY>` environment variables override the
/// file, which keeps credentials out of the checked-in config.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    finish(read_file(path.as_ref())?)
}

/// Reads the file plus environment overrides, without interpreting any section.
pub(crate) fn read_file(path: &Path) -> Result<config::Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    Ok(builder)
}

/// Parses configuration from TOML text without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [metadata_store]
        url = "postgres://meta@localhost/meta"
        max_connections = 2

        [results_store]
        url = "postgres://results@localhost/results"
        acquire_timeout_secs = 30

        [session]
        url = "postgres://session@localhost/session"
        application_name = "notebook"

        [logging]
        level = "debug"
        format = "compact"
    "#;

    #[test]
    fn loads_every_section() {
        let config = load_config_from_str(FULL).unwrap();
        assert_eq!(config.metadata_store.url, "postgres://meta@localhost/meta");
        assert_eq!(config.metadata_store.max_connections, 2);
        assert_eq!(config.results_store.acquire_timeout().as_secs(), 30);
        assert_eq!(config.session.application_name.as_deref(), Some("notebook"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn optional_keys_fall_back_to_defaults() {
        let config = load_config_from_str(
            r#"
            [metadata_store]
            url = "postgres://a"
            [results_store]
            url = "postgres://b"
            [session]
            url = "postgres://c"
            "#,
        )
        .unwrap();
        assert_eq!(config.results_store.max_connections, 5);
        assert_eq!(config.session.acquire_timeout_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn missing_section_is_a_load_error() {
        let err = load_config_from_str(
            r#"
            [metadata_store]
            url = "postgres://a"
            [session]
            url = "postgres://c"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn empty_url_fails_validation() {
        let err = load_config_from_str(
            r#"
            [metadata_store]
            url = ""
            [results_store]
            url = "postgres://b"
            [session]
            url = "postgres://c"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("metadata_store")));
    }

    #[test]
    fn zero_pool_size_fails_validation() {
        let err = load_config_from_str(
            r#"
            [metadata_store]
            url = "postgres://a"
            [results_store]
            url = "postgres://b"
            [session]
            url = "postgres://c"
            max_connections = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("session")));
    }
}
