// Template config adapter - Loads transcode templates from YAML and TOML files

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::TranscodeOptions;

/// Template file format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Yaml,
    Toml,
}

impl TemplateFormat {
    /// `.toml` is TOML; everything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => TemplateFormat::Toml,
            _ => TemplateFormat::Yaml,
        }
    }
}

/// Loads and layers template files into [`TranscodeOptions`]
#[derive(Debug, Default)]
pub struct TemplateConfigAdapter {
    merged: Mapping,
    sources: Vec<PathBuf>,
}

impl TemplateConfigAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every template in order; later files override earlier top-level keys
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<TranscodeOptions, DomainError> {
        let mut adapter = Self::new();
        for path in paths {
            adapter.load_file(path.as_ref())?;
        }
        adapter.options()
    }

    /// Read one template file and layer it over what was loaded so far
    pub fn load_file(&mut self, path: &Path) -> Result<(), DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::resource(format!("failed to read template {}", path.display()), e)
        })?;

        let format = TemplateFormat::from_path(path);
        self.load_str(&content, format).map_err(|e| match e {
            DomainError::InvalidConfig(message) => {
                DomainError::InvalidConfig(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;

        info!(template = %path.display(), ?format, "template loaded");
        self.sources.push(path.to_path_buf());
        Ok(())
    }

    /// Layer template text of the given format
    pub fn load_str(&mut self, content: &str, format: TemplateFormat) -> Result<(), DomainError> {
        let value = match format {
            TemplateFormat::Yaml => serde_yaml::from_str::<Value>(content)
                .map_err(|e| DomainError::InvalidConfig(format!("failed to parse YAML template: {}", e)))?,
            TemplateFormat::Toml => {
                let table: toml::Value = toml::from_str(content).map_err(|e| {
                    DomainError::InvalidConfig(format!("failed to parse TOML template: {}", e))
                })?;
                serde_yaml::to_value(table).map_err(|e| {
                    DomainError::InvalidConfig(format!("failed to convert TOML template: {}", e))
                })?
            }
        };

        match value {
            // An empty file
            Value::Null => Ok(()),
            Value::Mapping(mapping) => {
                for (key, value) in mapping {
                    debug!(key = ?key, "template key set");
                    self.merged.insert(key, value);
                }
                Ok(())
            }
            _ => Err(DomainError::InvalidConfig(
                "template must be a mapping of option names to values".to_string(),
            )),
        }
    }

    /// Files loaded so far, in order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Decode the merged templates
    pub fn options(&self) -> Result<TranscodeOptions, DomainError> {
        serde_yaml::from_value(Value::Mapping(self.merged.clone()))
            .map_err(|e| DomainError::InvalidConfig(format!("invalid template options: {}", e)))
    }
}
