//! # Extended Data
//!
//! Properties without a fixed tag slot are stored as extended data: an
//! ordered list of payloads, each introduced by a `(1001, appid)` tag and
//! owned by one registered application.
//!
//! The payload items are modelled as a small variant list, and each derived
//! property has its own pair of encode/decode functions:
//!
//! | Property | Application id | Payload |
//! |----------|----------------|---------|
//! | description | `AcAecLayerStandard` | `(1000, "")`, `(1000, text)` |
//! | transparency | `AcCmTransparency` | `(1071, flags \| alpha)` |
//!
//! Readers never fail on a missing or short payload, they fall back to the
//! empty description and full opacity.

use crate::colors::{float2transparency, transparency2float, TRANSPARENCY_FLAG};
use crate::error::{DxfError, Result};
use crate::tables::NameTable;
use crate::tags::{Tag, TagValue, TagWriter, XDATA_MARKER};
use log::debug;

pub const DESCRIPTION_APPID: &str = "AcAecLayerStandard";
pub const TRANSPARENCY_APPID: &str = "AcCmTransparency";

#[derive(Debug, Clone, PartialEq)]
pub enum XDataValue {
    /// 1000
    String(String),
    /// 1002, `{` or `}`
    ControlString(String),
    /// 1005
    Handle(String),
    /// 1040
    Real(f64),
    /// 1070
    Int16(i32),
    /// 1071
    Int32(i32),
    /// Anything else, kept as read
    Other(Tag),
}

impl XDataValue {
    pub fn from_tag(tag: &Tag) -> Self {
        match (tag.code, &tag.value) {
            (1000, TagValue::Str(s)) => XDataValue::String(s.clone()),
            (1002, TagValue::Str(s)) => XDataValue::ControlString(s.clone()),
            (1005, TagValue::Str(s)) => XDataValue::Handle(s.clone()),
            (1040, value) => match value.as_float() {
                Some(v) => XDataValue::Real(v),
                None => XDataValue::Other(tag.clone()),
            },
            (1070, TagValue::Int(v)) => XDataValue::Int16(*v),
            (1071, TagValue::Int(v)) => XDataValue::Int32(*v),
            _ => XDataValue::Other(tag.clone()),
        }
    }

    pub fn to_tag(&self) -> Tag {
        match self {
            XDataValue::String(s) => Tag::new(1000, s.as_str()),
            XDataValue::ControlString(s) => Tag::new(1002, s.as_str()),
            XDataValue::Handle(s) => Tag::new(1005, s.as_str()),
            XDataValue::Real(v) => Tag::new(1040, *v),
            XDataValue::Int16(v) => Tag::new(1070, *v),
            XDataValue::Int32(v) => Tag::new(1071, *v),
            XDataValue::Other(tag) => tag.clone(),
        }
    }
}

/// Extended data of one record, payloads in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XData {
    payloads: Vec<(String, Vec<XDataValue>)>,
}

impl XData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the xdata section of a tag group, which must start with 1001.
    pub fn from_tags(tags: &[Tag]) -> Result<Self> {
        let mut xdata = XData::new();
        for tag in tags {
            if tag.code == XDATA_MARKER {
                let appid = tag
                    .value
                    .as_str()
                    .ok_or_else(|| DxfError::Structure(format!("invalid appid tag {}", tag)))?;
                xdata.payloads.push((appid.to_string(), Vec::new()));
                continue;
            }
            match xdata.payloads.last_mut() {
                Some((_, items)) => items.push(XDataValue::from_tag(tag)),
                None => {
                    return Err(DxfError::Structure(format!(
                        "extended data tag {} before first appid",
                        tag
                    )))
                }
            }
        }
        Ok(xdata)
    }

    pub fn has(&self, appid: &str) -> bool {
        self.position(appid).is_some()
    }

    pub fn get(&self, appid: &str) -> Option<&[XDataValue]> {
        let idx = self.position(appid)?;
        Some(&self.payloads[idx].1)
    }

    /// Replaces the whole payload of `appid`, keeping its position.
    pub fn set(&mut self, appid: &str, items: Vec<XDataValue>) {
        match self.position(appid) {
            Some(idx) => self.payloads[idx].1 = items,
            None => self.payloads.push((appid.to_string(), items)),
        }
    }

    pub fn discard(&mut self, appid: &str) -> Option<Vec<XDataValue>> {
        let idx = self.position(appid)?;
        Some(self.payloads.remove(idx).1)
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn appids(&self) -> impl Iterator<Item = &str> {
        self.payloads.iter().map(|(appid, _)| appid.as_str())
    }

    pub fn export<W: TagWriter + ?Sized>(&self, writer: &mut W) {
        for (appid, items) in &self.payloads {
            writer.write_tag2(XDATA_MARKER, TagValue::Str(appid.clone()));
            for item in items {
                writer.write_tag(item.to_tag());
            }
        }
    }

    fn position(&self, appid: &str) -> Option<usize> {
        self.payloads.iter().position(|(id, _)| id == appid)
    }
}

/// Registers `appid` in the application id table if absent.
pub fn register_appid(appids: &mut NameTable, appid: &str) {
    if appids.ensure(appid, None) {
        debug!("registered appid {}", appid);
    }
}

pub fn encode_description(text: &str) -> Vec<XDataValue> {
    vec![
        XDataValue::String(String::new()),
        XDataValue::String(text.to_string()),
    ]
}

/// The second string item, or `""` for a missing or short payload.
pub fn decode_description(xdata: &XData) -> String {
    match xdata.get(DESCRIPTION_APPID) {
        Some([_, XDataValue::String(text), ..]) => text.clone(),
        _ => String::new(),
    }
}

/// Rejects values outside `[0, 1]`.
pub fn encode_transparency(value: f64) -> Result<Vec<XDataValue>> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DxfError::InvalidValue(format!(
            "transparency {} out of range [0, 1]",
            value
        )));
    }
    Ok(vec![XDataValue::Int32(float2transparency(value))])
}

/// Transparency in `[0, 1]`, 0.0 being opaque.
///
/// Values without the "real transparency" flag, including BYBLOCK, read as
/// opaque.
pub fn decode_transparency(xdata: &XData) -> f64 {
    match xdata.get(TRANSPARENCY_APPID) {
        Some([XDataValue::Int32(raw), ..]) if raw & TRANSPARENCY_FLAG != 0 => {
            transparency2float(*raw)
        }
        _ => 0.0,
    }
}
