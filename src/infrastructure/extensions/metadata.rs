//! Package descriptor (`metadata.json`) parsing and validation

use std::collections::BTreeMap;
use std::path::Path;
use serde::Deserialize;
use crate::application::errors::ValidationError;
use crate::domain::entities::ExtensionKind;

/// Descriptor file name at the package root
pub const METADATA_FILE: &str = "metadata.json";

/// Section name → key → default value
pub type ConfigDefaults = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Validated package metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionMetadata {
    /// Display name
    pub name: String,
    /// Unique machine identifier, also the installed file name
    pub raw_name: String,
    pub author: String,
    pub kind: ExtensionKind,
    pub config: Option<ConfigDefaults>,
}

#[derive(Deserialize)]
struct RawMetadata {
    name: Option<serde_json::Value>,
    raw_name: Option<serde_json::Value>,
    author: Option<serde_json::Value>,
    #[serde(rename = "type")]
    kind: Option<serde_json::Value>,
    config: Option<serde_json::Value>,
}

impl ExtensionMetadata {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::MetadataUnreadable(format!("Failed to read metadata: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ValidationError::MetadataUnreadable(e.to_string()))?;

        if !value.is_object() {
            return Err(ValidationError::MetadataUnreadable("metadata must be an object".to_string()));
        }

        let raw: RawMetadata = serde_json::from_value(value)
            .map_err(|e| ValidationError::MetadataUnreadable(e.to_string()))?;

        let name = required(raw.name, "name")?;
        let raw_name = required(raw.raw_name, "raw_name")?;
        let author = required(raw.author, "author")?;
        let kind_str = required(raw.kind, "type")?;

        if !is_safe_identifier(&raw_name) {
            return Err(ValidationError::InvalidRawName(raw_name));
        }

        let kind = ExtensionKind::from_package_type(&kind_str)
            .ok_or(ValidationError::UnknownType(kind_str))?;

        let config = match raw.config {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<ConfigDefaults>(value).map_err(|_| {
                    ValidationError::MetadataUnreadable(
                        "config must map section names to key/value tables".to_string(),
                    )
                })?,
            ),
        };

        Ok(Self {
            name,
            raw_name,
            author,
            kind,
            config,
        })
    }
}

fn required(value: Option<serde_json::Value>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ValidationError::MetadataIncomplete(field)),
    }
}

/// Raw names become file and module names, so keep them to `[A-Za-z0-9_-]`.
fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_metadata() {
        let meta = ExtensionMetadata::parse(
            r#"{
                "name": "Greeter",
                "raw_name": "greet",
                "author": "zach",
                "type": "feature",
                "config": {"greeting": {"text": "hello", "times": 2}}
            }"#,
        )
        .unwrap();

        assert_eq!(meta.raw_name, "greet");
        assert_eq!(meta.kind, ExtensionKind::Feature);
        let config = meta.config.unwrap();
        assert_eq!(config["greeting"]["text"], serde_json::json!("hello"));
        assert_eq!(config["greeting"]["times"], serde_json::json!(2));
    }

    #[test]
    fn test_malformed_json_is_unreadable() {
        let err = ExtensionMetadata::parse("{ not json").unwrap_err();
        assert!(matches!(err, ValidationError::MetadataUnreadable(_)));
    }

    #[test]
    fn test_missing_fields_are_incomplete() {
        let err = ExtensionMetadata::parse(r#"{"name": "x", "raw_name": "x", "type": "cog"}"#).unwrap_err();
        assert_eq!(err, ValidationError::MetadataIncomplete("author"));

        let err = ExtensionMetadata::parse(r#"{"name": "x", "raw_name": "  ", "author": "a", "type": "cog"}"#)
            .unwrap_err();
        assert_eq!(err, ValidationError::MetadataIncomplete("raw_name"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = ExtensionMetadata::parse(r#"{"name": "x", "raw_name": "x", "author": "a", "type": "plugin"}"#)
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownType("plugin".to_string()));
    }

    #[test]
    fn test_path_like_raw_name_rejected() {
        let err = ExtensionMetadata::parse(r#"{"name": "x", "raw_name": "../evil", "author": "a", "type": "cog"}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRawName(_)));
    }

    #[test]
    fn test_bad_config_shape_is_unreadable() {
        let err = ExtensionMetadata::parse(
            r#"{"name": "x", "raw_name": "x", "author": "a", "type": "cog", "config": ["nope"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MetadataUnreadable(_)));
    }
}
