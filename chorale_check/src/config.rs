// Checker configuration.
//
// A small JSON document; every field is optional:
//
//   {
//     "key": "Bb",
//     "disabled_rules": ["SevenSevenChordResolved"],
//     "parallel": false
//   }
//
// `key` overrides both the document key and key detection. Rule names in
// `disabled_rules` are validated against the catalogue when the registry is
// built (see `RuleRegistry::from_config`). CLI flags override file values.

use crate::error::{Error, PreprocessingError, Result};
use chorale_theory::Key;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Key name forced for every score, e.g. "C", "f#", "Ebm".
    pub key: Option<String>,
    /// Rules left out of the registry.
    pub disabled_rules: Vec<String>,
    /// Evaluate chord positions on the rayon pool.
    pub parallel: bool,
}

impl CheckConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// The configured key, parsed.
    pub fn key_override(&self) -> Result<Option<Key>> {
        self.key
            .as_deref()
            .map(|text| text.parse::<Key>().map_err(PreprocessingError::Key))
            .transpose()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorale_theory::KeyMode;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(CheckConfig::from_json("{}").unwrap(), CheckConfig::default());
    }

    #[test]
    fn test_fields() {
        let config = CheckConfig::from_json(
            r#"{"key": "Ebm", "disabled_rules": ["HasThird"], "parallel": true}"#,
        )
        .unwrap();
        assert!(config.parallel);
        assert_eq!(config.disabled_rules, vec!["HasThird".to_string()]);
        let key = config.key_override().unwrap().unwrap();
        assert_eq!(key.mode(), KeyMode::Minor);
        assert_eq!(key.display_label(), "Emb");
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            CheckConfig::from_json("{\"parallel\": 3}"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_key_is_preprocessing_error() {
        let config = CheckConfig {
            key: Some("H major".to_string()),
            ..CheckConfig::default()
        };
        assert!(matches!(config.key_override(), Err(Error::Preprocessing(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.json");
        std::fs::write(&path, r#"{"parallel": true}"#).unwrap();
        assert!(CheckConfig::load(&path).unwrap().parallel);
        assert!(matches!(
            CheckConfig::load(&dir.path().join("missing.json")),
            Err(Error::Config(_))
        ));
    }
}
