//! # Tags
//!
//! A tag is the atomic unit of the interchange format: an integer group code
//! paired with a value. The tokenizer that produces tags from raw bytes lives
//! outside this crate; everything here operates on already typed tags.
//!
//! ## Writing
//!
//! Exporters never build tag vectors directly. They write through the
//! [`TagWriter`] trait, which also carries the target [`DxfVersion`] so that
//! version gating can be decided at the point of writing.
//! [`TagCollector`] is the in-memory writer used by tests and by callers that
//! want to hand the tags to a serializer of their own.

use crate::version::DxfVersion;
use std::fmt;

pub const STRUCTURE_MARKER: i32 = 0;
pub const HANDLE_CODE: i32 = 5;
pub const APP_DATA_MARKER: i32 = 102;
pub const SUBCLASS_MARKER: i32 = 100;
pub const OWNER_CODE: i32 = 330;
pub const XDATA_MARKER: i32 = 1001;

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Str(String),
    Int(i32),
    Float(f64),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            TagValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            TagValue::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(s) => f.write_str(s),
            TagValue::Int(v) => write!(f, "{}", v),
            TagValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub code: i32,
    pub value: TagValue,
}

impl Tag {
    pub fn new(code: i32, value: impl Into<TagValue>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }

    pub fn is_structure(&self) -> bool {
        self.code == STRUCTURE_MARKER
    }

    pub fn is_subclass_marker(&self) -> bool {
        self.code == SUBCLASS_MARKER
    }

    /// `(102, "{APPNAME")`
    pub fn is_app_data_start(&self) -> bool {
        self.code == APP_DATA_MARKER && self.value.as_str().is_some_and(|s| s.starts_with('{'))
    }

    /// `(102, "}")`
    pub fn is_app_data_end(&self) -> bool {
        self.code == APP_DATA_MARKER && self.value.as_str() == Some("}")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.code, self.value)
    }
}

/// Output side of the tag stream.
pub trait TagWriter {
    /// Version the output is written for.
    fn dxfversion(&self) -> DxfVersion;

    fn write_tag(&mut self, tag: Tag);

    fn write_tag2(&mut self, code: i32, value: TagValue) {
        self.write_tag(Tag { code, value });
    }

    fn write_subclass_marker(&mut self, name: &str) {
        self.write_tag2(SUBCLASS_MARKER, TagValue::Str(name.to_string()));
    }
}

/// Collects written tags in memory.
#[derive(Debug, Clone)]
pub struct TagCollector {
    version: DxfVersion,
    pub tags: Vec<Tag>,
}

impl TagCollector {
    pub fn new(version: DxfVersion) -> Self {
        Self {
            version,
            tags: Vec::new(),
        }
    }

    pub fn into_tags(self) -> Vec<Tag> {
        self.tags
    }

    pub fn has_code(&self, code: i32) -> bool {
        self.tags.iter().any(|t| t.code == code)
    }
}

impl TagWriter for TagCollector {
    fn dxfversion(&self) -> DxfVersion {
        self.version
    }

    fn write_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }
}
