//! DXF document versions.
//!
//! Versions are totally ordered by release, so gating an attribute is a plain
//! comparison: an attribute with `min_version` R2004 exists in every document
//! whose version is `>= DxfVersion::R2004`.

use crate::error::{DxfError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum DxfVersion {
    /// Legacy format: no subclass markers, no owner handles.
    #[serde(rename = "AC1009")]
    R12,
    #[serde(rename = "AC1015")]
    R2000,
    #[serde(rename = "AC1018")]
    R2004,
    #[serde(rename = "AC1021")]
    R2007,
    #[serde(rename = "AC1024")]
    R2010,
    #[default]
    #[serde(rename = "AC1027")]
    R2013,
    #[serde(rename = "AC1032")]
    R2018,
}

impl DxfVersion {
    /// The oldest supported version.
    pub const OLDEST: DxfVersion = DxfVersion::R12;

    pub const ALL: [DxfVersion; 7] = [
        DxfVersion::R12,
        DxfVersion::R2000,
        DxfVersion::R2004,
        DxfVersion::R2007,
        DxfVersion::R2010,
        DxfVersion::R2013,
        DxfVersion::R2018,
    ];

    /// The `$ACADVER` header string.
    pub fn acad_release(&self) -> &'static str {
        match self {
            DxfVersion::R12 => "AC1009",
            DxfVersion::R2000 => "AC1015",
            DxfVersion::R2004 => "AC1018",
            DxfVersion::R2007 => "AC1021",
            DxfVersion::R2010 => "AC1024",
            DxfVersion::R2013 => "AC1027",
            DxfVersion::R2018 => "AC1032",
        }
    }

    /// Subclass markers are written for every version newer than the legacy one.
    pub fn has_subclass_markers(&self) -> bool {
        *self > DxfVersion::OLDEST
    }
}

impl fmt::Display for DxfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.acad_release())
    }
}

impl FromStr for DxfVersion {
    type Err = DxfError;

    /// Accepts `AC10xx` header strings and `R12`/`R2000`-style names.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        DxfVersion::ALL
            .into_iter()
            .find(|v| v.acad_release() == normalized || format!("{:?}", v) == normalized)
            .ok_or_else(|| DxfError::InvalidValue(format!("unknown DXF version '{}'", s)))
    }
}
