//! Named request templates persisted as `{"presets": [...]}` JSON.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extractors::Attribute;
use crate::request::{ExtractionRequest, Mode, RequestBuilder};

pub const DEFAULT_PRESETS_FILE: &str = "presets.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub url: String,
    pub selector: String,
    #[serde(default)]
    pub attribute: Attribute,
    #[serde(default)]
    pub mode: Mode,
    #[serde(
        default,
        rename = "contains_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub contains: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Preset {
    /// Request builder pre-filled from this preset.
    pub fn to_request_builder(&self) -> RequestBuilder {
        ExtractionRequest::builder(self.url.as_str(), self.selector.as_str())
            .attribute(self.attribute.clone())
            .mode(self.mode)
            .contains(self.contains.clone())
    }

    /// `name (mode)`, as shown in listings.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.mode)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PresetFile {
    #[serde(default)]
    presets: Vec<Preset>,
}

/// The two presets available when no usable presets file exists.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "HTTPBin Test Page".to_string(),
            url: "https://httpbin.org/html".to_string(),
            selector: "h1, p".to_string(),
            attribute: Attribute::Text,
            mode: Mode::Simple,
            contains: None,
            description: "Reliable test page - always works!".to_string(),
        },
        Preset {
            name: "Example.com Elements".to_string(),
            url: "https://example.com".to_string(),
            selector: "h1, p, a".to_string(),
            attribute: Attribute::Text,
            mode: Mode::Simple,
            contains: None,
            description: "Simple example website for testing".to_string(),
        },
    ]
}

/// In-memory preset list bound to a file.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
    presets: Vec<Preset>,
}

impl PresetStore {
    /// Read `path`. A missing or malformed file yields the built-in presets.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let presets = match read_presets(&path) {
            Ok(presets) => {
                info!("Loaded {} presets from {}", presets.len(), path.display());
                presets
            }
            Err(e) => {
                warn!("Using built-in presets: {e}");
                builtin_presets()
            }
        };
        Self { path, presets }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&Preset> {
        let name = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Like [`find`](Self::find), but a miss is an error listing the known names.
    pub fn get(&self, name: &str) -> Result<&Preset> {
        self.find(name).ok_or_else(|| {
            let known: Vec<&str> = self.presets.iter().map(|p| p.name.as_str()).collect();
            Error::Preset(format!(
                "no preset named `{name}` (available: {})",
                known.join(", ")
            ))
        })
    }

    /// Replace the preset with the same name, or append.
    pub fn upsert(&mut self, preset: Preset) {
        match self
            .presets
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&preset.name))
        {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    /// Overwrite the file with the current list, pretty-printed.
    pub fn save(&self) -> Result<()> {
        let body = serde_json::to_string_pretty(&PresetFile {
            presets: self.presets.clone(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Export {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, body).map_err(|source| Error::Export {
            path: self.path.clone(),
            source,
        })?;
        info!("Saved {} presets to {}", self.presets.len(), self.path.display());
        Ok(())
    }
}

fn read_presets(path: &Path) -> Result<Vec<Preset>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Preset(format!("cannot read {}: {e}", path.display())))?;
    let file: PresetFile = serde_json::from_str(&raw)
        .map_err(|e| Error::Preset(format!("{} is malformed: {e}", path.display())))?;
    Ok(file.presets)
}
