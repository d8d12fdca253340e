//! JSON/YAML document files for catalogs and selections.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreResult;

/// Serialization format of a document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` and `.yml` are YAML; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, content: &str) -> CoreResult<T> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        })
    }

    pub fn render<T: Serialize>(self, value: &T) -> CoreResult<String> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(value)?,
            Self::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

/// Read a document, picking the format from the file extension.
pub fn read_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> CoreResult<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    DocumentFormat::from_path(path).parse(&content)
}

/// Write a document, picking the format from the file extension.
pub fn write_document<T: Serialize>(path: impl AsRef<Path>, value: &T) -> CoreResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = DocumentFormat::from_path(path).render(value)?;
    fs::write(path, content)?;
    Ok(())
}
