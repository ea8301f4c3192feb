use serde::{Deserialize, Serialize};
use xmledit_parser::SerializeOptions;

/// Editor configuration, loaded by hosts from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Indentation shared by the serializer and the parser
    #[serde(default)]
    pub codec: SerializeOptions,

    /// Upper bound on normalizer repairs; derived from the tree size when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_normalize_passes: Option<usize>,

    /// `rel` given to links that open in a new tab
    #[serde(default = "default_blank_target_rel")]
    pub blank_target_rel: String,
}

fn default_blank_target_rel() -> String {
    "noopener noreferrer".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            codec: SerializeOptions::default(),
            max_normalize_passes: None,
            blank_target_rel: default_blank_target_rel(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: EditorConfig = serde_json::from_str(text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "codec": { "indent": "    " },
            "maxNormalizePasses": 50,
            "blankTargetRel": "noopener"
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.codec.indent, "    ");
        assert_eq!(config.max_normalize_passes, Some(50));
        assert_eq!(config.blank_target_rel, "noopener");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.codec.indent, "  ");
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(EditorConfig::from_json(r#"{"maxNormalizePasses": "lots"}"#).is_err());
    }
}
