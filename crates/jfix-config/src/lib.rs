//! Configuration for jfix quick fixes (`jfix.toml`) and the global `tracing` setup.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use jfix_core::JavaLanguageLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

mod diagnostics;
mod schema;
mod validation;

pub use diagnostics::{ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics};
pub use schema::json_schema;

/// Top-level `jfix.toml` configuration.
///
/// ```toml
/// [java]
/// source = 17
///
/// [convert_loop]
/// default_element_name = "element"
/// strict = true
///
/// [logging]
/// level = "info"
/// json = false
/// stderr = true
/// file = "/tmp/jfix.log"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct JfixConfig {
    /// Source settings of the project the fixes run against.
    #[serde(default)]
    pub java: JavaConfig,

    /// Settings for the "convert to enhanced for loop" quick fix.
    #[serde(default)]
    pub convert_loop: ConvertLoopConfig,

    /// Global logging settings for jfix crates.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct JavaConfig {
    /// Java feature release of the sources (`4` for 1.4, `8`, `17`, ...).
    #[serde(default = "JavaConfig::default_source")]
    #[schemars(range(min = 1))]
    pub source: u16,
}

impl JavaConfig {
    fn default_source() -> u16 {
        JavaLanguageLevel::JAVA_17.major
    }
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            source: Self::default_source(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ConvertLoopConfig {
    /// Identifier proposed for the loop variable when the iterator is raw.
    #[serde(default = "ConvertLoopConfig::default_element_name")]
    pub default_element_name: String,

    /// Only offer the conversion when the loop is driven solely by `hasNext()`/`next()`
    /// (or `hasMoreElements()`/`nextElement()`) on the iterator.
    ///
    /// With `strict = false` any loop with a recognized iterator and iterable is offered, and
    /// the rewrite drops its condition and updaters.
    #[serde(default = "ConvertLoopConfig::default_strict")]
    pub strict: bool,
}

impl ConvertLoopConfig {
    fn default_element_name() -> String {
        "element".to_owned()
    }

    fn default_strict() -> bool {
        true
    }
}

impl Default for ConvertLoopConfig {
    fn default() -> Self {
        Self {
            default_element_name: Self::default_element_name(),
            strict: Self::default_strict(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level for all jfix crates, or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path.
    ///
    /// If the file cannot be opened, file logging is disabled while stderr stays active.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Effective `EnvFilter`: the configured level merged with `RUST_LOG` when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a source snippet; keep just the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl JfixConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read_config(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }

    /// Load a config file from TOML and return diagnostics (unknown keys and semantic
    /// validation failures).
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let text = read_config(path.as_ref())?;
        Self::load_from_str_with_diagnostics(&text)
    }

    /// Load a config from a TOML string and return diagnostics.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<JfixConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.extend_validation(config.validate());

        if !diagnostics.is_empty() {
            tracing::debug!(
                target: "jfix.config",
                unknown_keys = diagnostics.unknown_keys.len(),
                warnings = diagnostics.warnings.len(),
                errors = diagnostics.errors.len(),
                "config loaded with diagnostics"
            );
        }

        Ok((config, diagnostics))
    }

    /// Language level the quick fixes are gated on.
    #[must_use]
    pub fn language_level(&self) -> JavaLanguageLevel {
        JavaLanguageLevel::new(self.java.source)
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

static TRACING_INIT: Once = Once::new();

/// Writes every log line to a shared, append-mode file.
#[derive(Clone)]
struct MutexFileMakeWriter {
    file: Arc<Mutex<std::fs::File>>,
}

struct MutexFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl std::io::Write for MutexFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.file.lock() {
            Ok(mut file) => file.write(buf),
            Err(poisoned) => poisoned.into_inner().write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.file.lock() {
            Ok(mut file) => file.flush(),
            Err(poisoned) => poisoned.into_inner().flush(),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for MutexFileMakeWriter {
    type Writer = MutexFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MutexFileWriter {
            file: self.file.clone(),
        }
    }
}

/// Initializes structured `tracing` logging.
///
/// Safe to call multiple times; only the first call installs a global subscriber.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let file = config
            .file
            .as_ref()
            .and_then(|path| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .ok()
            })
            .map(|file| Arc::new(Mutex::new(file)));
        let file_open_failed = config.file.is_some() && file.is_none();

        let mut make_writer = BoxMakeWriter::new(std::io::sink);
        if config.stderr {
            // `TestWriter` keeps `cargo test` output captured in debug builds.
            if cfg!(debug_assertions) {
                make_writer = BoxMakeWriter::new(
                    make_writer.and(tracing_subscriber::fmt::writer::TestWriter::with_stderr),
                );
            } else {
                make_writer = BoxMakeWriter::new(make_writer.and(std::io::stderr));
            }
        }
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(MutexFileMakeWriter { file }));
        }

        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() && file_open_failed {
            if let Some(path) = config.file.as_ref() {
                tracing::warn!(
                    target: "jfix.config",
                    path = %path.display(),
                    "failed to open log file; file logging is disabled"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_synonyms_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives("WARNING"), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives("  "), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("jfix.refactor=debug"),
            "jfix.refactor=debug"
        );
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = JfixConfig::default();
        assert_eq!(config.java.source, 17);
        assert_eq!(config.convert_loop.default_element_name, "element");
        assert!(config.convert_loop.strict);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.stderr);
        assert_eq!(config.language_level(), JavaLanguageLevel::JAVA_17);
    }

    #[test]
    fn init_tracing_is_idempotent() {
        let config = LoggingConfig {
            stderr: false,
            ..LoggingConfig::default()
        };
        init_tracing(&config);
        init_tracing(&config);
        tracing::info!(target: "jfix.config", "still alive");
    }
}
