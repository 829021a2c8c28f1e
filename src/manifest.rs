use serde::Serialize;
use serde_yaml::Value;
use std::path::Path;

use crate::error::{PluginError, Result};

pub const MANIFEST_ENTRY: &str = "plugin.yml";

/// Declared identity of a plugin, taken from its `plugin.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
}

impl PluginManifest {
    /// Name with path separators neutralised, for use as one directory segment.
    pub fn name_segment(&self) -> String {
        sanitize_segment(&self.name)
    }

    pub fn version_segment(&self) -> String {
        sanitize_segment(&self.version)
    }

    pub fn jar_file_name(&self) -> String {
        format!("{}.jar", self.name_segment().to_lowercase())
    }
}

/// Decodes `plugin.yml` bytes. `archive` is only used to label errors.
pub fn parse_manifest(bytes: &[u8], archive: &Path) -> Result<PluginManifest> {
    let malformed = |reason: String| PluginError::MalformedManifest {
        path: archive.to_path_buf(),
        reason,
    };

    let doc: Value = serde_yaml::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    let Value::Mapping(map) = doc else {
        return Err(malformed("document is not a mapping".to_string()));
    };

    let field = |key: &str| -> Result<String> {
        let value = map
            .get(key)
            .ok_or_else(|| malformed(format!("missing `{key}`")))?;
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(malformed(format!(
                    "`{key}` must be a string, found {}",
                    yaml_kind(other)
                )));
            }
        };
        if text.trim().is_empty() {
            return Err(malformed(format!("`{key}` is empty")));
        }
        Ok(text)
    };

    Ok(PluginManifest {
        name: field("name")?,
        version: field("version")?,
    })
}

pub fn sanitize_segment(raw: &str) -> String {
    raw.replace(['/', '\\'], "_")
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
