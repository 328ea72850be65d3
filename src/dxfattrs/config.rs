use crate::error::{DxfError, Result};
use crate::version::DxfVersion;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

/// Library settings, stored as `config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DxfConfig {
    /// Version of newly created documents, `AC1027` or `R2013`
    #[serde(default, deserialize_with = "version_from_str")]
    pub dxfversion: DxfVersion,

    /// Keep tags the schemas do not declare, for lossless round trips
    #[serde(default = "default_true")]
    pub preserve_unknown_tags: bool,

    /// Write optional attributes that were explicitly set to their default
    #[serde(default = "default_true")]
    pub export_explicit_optional_defaults: bool,
}

fn default_true() -> bool {
    true
}

fn version_from_str<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DxfVersion, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl Default for DxfConfig {
    fn default() -> Self {
        Self {
            dxfversion: DxfVersion::default(),
            preserve_unknown_tags: true,
            export_explicit_optional_defaults: true,
        }
    }
}

impl DxfConfig {
    /// Loads `config.json` from `config_dir`, defaults if there is none.
    ///
    /// An unknown `dxfversion` is rejected instead of silently falling back.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let path = config_dir.as_ref().join(CONFIG_FILENAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(DxfError::Io(e)),
        };
        let config: DxfConfig = serde_json::from_str(&content)?;
        debug!("{}: new documents are {}", path.display(), config.dxfversion);
        Ok(config)
    }

    /// Writes `config.json`, the version as its `AC10xx` header string.
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }
}
