use jfix_core::{is_java_identifier, JavaLanguageLevel};

use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::{JfixConfig, LoggingConfig};

impl JfixConfig {
    /// Validate semantic invariants for a configuration, reporting every problem in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        validate_java(self, &mut out);
        validate_convert_loop(self, &mut out);
        validate_logging(self, &mut out);

        out
    }
}

fn validate_java(config: &JfixConfig, out: &mut ValidationDiagnostics) {
    if config.java.source == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "java.source".to_string(),
            message: "must be >= 1".to_string(),
        });
    } else if !config.language_level().supports_enhanced_for() {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "java.source".to_string(),
            message: format!(
                "source level {} predates Java {}; loop conversion is never offered",
                config.java.source,
                JavaLanguageLevel::JAVA_5.major
            ),
        });
    }
}

fn validate_convert_loop(config: &JfixConfig, out: &mut ValidationDiagnostics) {
    let name = &config.convert_loop.default_element_name;
    if !is_java_identifier(name) {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "convert_loop.default_element_name".to_string(),
            message: format!("`{name}` is not a valid Java identifier"),
        });
    }
}

fn validate_logging(config: &JfixConfig, out: &mut ValidationDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}
