use serde::de::DeserializeOwned;

/// Diagnostics produced while loading and validating a jfix config.
///
/// Callers always get a `JfixConfig` when deserialization succeeds, plus the issues that may
/// impact quick fix behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the input TOML that the schema does not know, as dotted paths
    /// (`convert_loop.stirct`).
    pub unknown_keys: Vec<String>,
    /// Non-fatal issues; a default is used instead of the offending value.
    pub warnings: Vec<ConfigWarning>,
    /// Values the quick fixes cannot run with.
    pub errors: Vec<ConfigValidationError>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn extend_validation(&mut self, validation: ValidationDiagnostics) {
        self.warnings.extend(validation.warnings);
        self.errors.extend(validation.errors);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationDiagnostics {
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<ConfigValidationError>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    InvalidValue { toml_path: String, message: String },
    LoggingLevelInvalid { value: String, normalized: String },
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue { toml_path: String, message: String },
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(normalize_serde_ignored_path(path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

fn normalize_serde_ignored_path(path: serde_ignored::Path) -> String {
    // `serde_ignored` renders root paths with a leading `.`.
    path.to_string().trim_start_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn unknown_key_paths_are_dotted() {
        #[derive(Debug, Deserialize)]
        struct Root {
            #[allow(dead_code)]
            section: Section,
        }

        #[derive(Debug, Deserialize)]
        struct Section {
            #[allow(dead_code)]
            known: bool,
        }

        let text = r#"
[section]
known = true
typo = 1
"#;

        let (_value, unknown) = deserialize_toml_with_unknown_keys::<Root>(text).expect("parse");
        assert_eq!(unknown, vec!["section.typo"]);
    }
}
