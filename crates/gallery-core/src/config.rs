//! Tool configuration, read from the host editor's per-tool config object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryConfig {
    /// Images per block before drops from other blocks are refused.
    pub max_images_per_block: usize,
    /// A lone image narrower than this renders at its natural width.
    pub natural_width_threshold: u32,
    /// Block kind name the tool is registered under in the host.
    pub block_kind: String,
    /// `accept` attribute of the file picker.
    pub accept: String,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            max_images_per_block: 3,
            natural_width_threshold: 800,
            block_kind: "gallery".to_string(),
            accept: "image/*".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl GalleryConfig {
    /// Parse from the JSON form of a host config object. Unknown keys are
    /// ignored and missing keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }

    /// Whether a MIME type passes the picker's `accept` filter.
    pub fn accepts(&self, mime_type: &str) -> bool {
        self.accept.split(',').map(str::trim).any(|pattern| {
            match pattern.strip_suffix("/*") {
                Some(major) => mime_type
                    .split_once('/')
                    .is_some_and(|(m, _)| m.eq_ignore_ascii_case(major)),
                None => pattern.eq_ignore_ascii_case(mime_type),
            }
        })
    }
}
