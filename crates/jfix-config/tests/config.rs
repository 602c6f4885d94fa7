use std::io::Write;

use jfix_config::{
    json_schema, ConfigError, ConfigValidationError, ConfigWarning, JfixConfig,
};
use jfix_core::JavaLanguageLevel;
use pretty_assertions::assert_eq;

#[test]
fn loads_full_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        r#"
[java]
source = 8

[convert_loop]
default_element_name = "item"
strict = false

[logging]
level = "debug"
json = true
stderr = false
file = "/tmp/jfix-test.log"
"#
    )
    .expect("write config");

    let config = JfixConfig::load_from_path(file.path()).expect("load");
    assert_eq!(config.language_level(), JavaLanguageLevel::JAVA_8);
    assert_eq!(config.convert_loop.default_element_name, "item");
    assert!(!config.convert_loop.strict);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
    assert_eq!(
        config.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/jfix-test.log"))
    );
}

#[test]
fn missing_sections_use_defaults() {
    let (config, diagnostics) =
        JfixConfig::load_from_str_with_diagnostics("[java]\nsource = 11\n").expect("parse");
    assert!(diagnostics.is_empty());
    assert_eq!(config.java.source, 11);
    assert_eq!(config.convert_loop, JfixConfig::default().convert_loop);
    assert_eq!(config.logging, JfixConfig::default().logging);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = JfixConfig::load_from_path(dir.path().join("jfix.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn type_errors_are_reported_without_snippets() {
    let err = JfixConfig::load_from_str_with_diagnostics("[convert_loop]\nstrict = \"yes\"\n")
        .unwrap_err();
    let ConfigError::Toml(message) = err else {
        panic!("expected a toml error, got {err:?}");
    };
    assert!(!message.contains("[convert_loop]"), "{message}");
}

#[test]
fn unknown_keys_are_collected() {
    let text = r#"
[convert_loop]
stirct = true

[colors]
enabled = true
"#;
    let (_config, diagnostics) = JfixConfig::load_from_str_with_diagnostics(text).expect("parse");
    assert_eq!(diagnostics.unknown_keys, vec!["colors", "convert_loop.stirct"]);
    assert!(diagnostics.is_ok());
}

#[test]
fn invalid_values_are_diagnosed() {
    let text = r#"
[java]
source = 0

[convert_loop]
default_element_name = "for"

[logging]
level = "jfix=loud"
"#;
    let (_config, diagnostics) = JfixConfig::load_from_str_with_diagnostics(text).expect("parse");
    assert_eq!(
        diagnostics.errors,
        vec![
            ConfigValidationError::InvalidValue {
                toml_path: "java.source".to_string(),
                message: "must be >= 1".to_string(),
            },
            ConfigValidationError::InvalidValue {
                toml_path: "convert_loop.default_element_name".to_string(),
                message: "`for` is not a valid Java identifier".to_string(),
            },
        ]
    );
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { .. }]
    ));
}

#[test]
fn old_source_level_warns() {
    let (_config, diagnostics) =
        JfixConfig::load_from_str_with_diagnostics("[java]\nsource = 4\n").expect("parse");
    assert!(diagnostics.is_ok());
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::InvalidValue { toml_path, .. }] if toml_path == "java.source"
    ));
}

#[test]
fn schema_describes_every_section() {
    let schema = serde_json::to_value(json_schema()).expect("serialize schema");
    let properties = schema["properties"].as_object().expect("properties");
    let mut keys: Vec<&str> = properties.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["convert_loop", "java", "logging"]);
    assert_eq!(schema["additionalProperties"], serde_json::json!(false));
}
