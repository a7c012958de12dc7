use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{
    BotConfig, Config, EngineSettings, LoggingSettings, RiskManagement, SizingConfig,
};

/// Prefix for environment overrides, e.g. `SWINGLINE__RISK_MANAGEMENT__STOP_LOSS_PCT=0.75`.
pub const ENV_PREFIX: &str = "SWINGLINE";

/// Loads and validates the application configuration.
///
/// The TOML file at `path` is the base layer; environment variables prefixed with
/// `SWINGLINE__` override individual keys. Validation runs before the config is
/// returned, so a bad stop-loss or allocation never reaches live trading.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

/// Parses and validates configuration from an in-memory TOML document.
pub fn config_from_toml(contents: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(contents, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
