//! # Layer Record
//!
//! A layer is a named entry of the layer table. Drawing records reference it
//! by name, viewports freeze it by handle.
//!
//! ## Encoded State
//!
//! Several properties share storage with others and must only be changed
//! through the methods here:
//!
//! - **Visibility** is the sign of `color`: negative means off. Toggling
//!   visibility keeps the magnitude, setting a color keeps the sign.
//! - **Frozen/locked** are bits 0 and 2 of `flags`; all other bits are
//!   preserved.
//! - **Description** and **transparency** have no tag slot and live in
//!   extended data, see [`crate::xdata`].
//!
//! Renaming is a document-wide operation, see [`crate::consistency`].

use super::{export_namespace, BASE_ATTRIBS};
use crate::attributes::validation::{
    fix_layer_color, fix_layer_lineweight, is_integer_bool, is_valid_layer_color_index,
    is_valid_layer_lineweight, is_valid_layer_name, is_valid_table_name,
};
use crate::attributes::{
    AttrValue, AttributeDef, AttributeKind, Fixer, Namespace, Schema, Subclass, TableRef,
    Validator,
};
use crate::codec::{self, CodecOptions, TagGroup};
use crate::colors::{int2rgb, rgb2int, Rgb};
use crate::error::{DxfError, Result};
use crate::overrides::OverrideMap;
use crate::store::Handle;
use crate::tables::NameTable;
use crate::tags::{TagValue, TagWriter};
use crate::version::DxfVersion;
use crate::xdata::{self, XData, DESCRIPTION_APPID, TRANSPARENCY_APPID};
use once_cell::sync::Lazy;

pub const DXFTYPE: &str = "LAYER";

pub const FROZEN: i32 = 0b0000_0001;
pub const LOCKED: i32 = 0b0000_0100;

const LAYER_TABLE_RECORD: &[AttributeDef] = &[
    AttributeDef::new("name", 2, AttributeKind::Str)
        .default_str("0")
        .validator(Validator::Str(is_valid_layer_name)),
    AttributeDef::new("flags", 70, AttributeKind::Int).default_int(0),
    // negative color: layer is off
    AttributeDef::new("color", 62, AttributeKind::Int)
        .default_int(7)
        .validator(Validator::Int(is_valid_layer_color_index))
        .fixer(Fixer::Int(fix_layer_color)),
    // 0x00RRGGBB
    AttributeDef::new("true_color", 420, AttributeKind::Int)
        .since(DxfVersion::R2004)
        .optional(),
    AttributeDef::new("linetype", 6, AttributeKind::Str)
        .default_str("Continuous")
        .validator(Validator::Str(is_valid_table_name))
        .refers_to(TableRef::Linetype),
    AttributeDef::new("plot", 290, AttributeKind::BoolInt)
        .default_int(1)
        .since(DxfVersion::R2000)
        .optional()
        .validator(Validator::Int(is_integer_bool))
        .fixer(Fixer::ReturnDefault),
    AttributeDef::new("lineweight", 370, AttributeKind::Int)
        .default_int(-3)
        .since(DxfVersion::R2000)
        .validator(Validator::Int(is_valid_layer_lineweight))
        .fixer(Fixer::Int(fix_layer_lineweight)),
    AttributeDef::new("plotstyle_handle", 390, AttributeKind::Handle).since(DxfVersion::R2000),
    AttributeDef::new("material_handle", 347, AttributeKind::Handle).since(DxfVersion::R2007),
    AttributeDef::new("unknown1", 348, AttributeKind::Handle)
        .since(DxfVersion::R2007)
        .optional(),
];

const SUBCLASSES: &[Subclass] = &[
    Subclass {
        marker: None,
        attributes: BASE_ATTRIBS,
    },
    Subclass {
        marker: Some("AcDbSymbolTableRecord"),
        attributes: &[],
    },
    Subclass {
        marker: Some("AcDbLayerTableRecord"),
        attributes: LAYER_TABLE_RECORD,
    },
];

pub static LAYER_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new(DXFTYPE, SUBCLASSES));

#[derive(Debug, Clone)]
pub struct Layer {
    pub dxf: Namespace,
    pub xdata: XData,
    committed_overrides: OverrideMap,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    pub fn new() -> Self {
        Self {
            dxf: Namespace::new(&LAYER_SCHEMA),
            xdata: XData::new(),
            committed_overrides: OverrideMap::new(),
        }
    }

    pub fn load(group: TagGroup<'_>, version: DxfVersion, options: CodecOptions) -> Result<Self> {
        Ok(Self {
            dxf: codec::load_namespace(&LAYER_SCHEMA, group.body, version, options),
            xdata: XData::from_tags(group.xdata)?,
            committed_overrides: OverrideMap::new(),
        })
    }

    pub fn export<W: TagWriter + ?Sized>(
        &self,
        writer: &mut W,
        options: CodecOptions,
    ) -> Result<()> {
        writer.write_tag2(0, TagValue::Str(DXFTYPE.to_string()));
        export_namespace(&self.dxf, writer, options)?;
        self.xdata.export(writer);
        Ok(())
    }

    pub fn handle(&self) -> Option<Handle> {
        self.dxf.get_handle("handle")
    }

    pub fn name(&self) -> String {
        self.dxf.get_str("name").unwrap_or_default()
    }

    pub fn flags(&self) -> i32 {
        self.dxf.get_int("flags").unwrap_or(0)
    }

    pub fn is_frozen(&self) -> bool {
        self.flags() & FROZEN != 0
    }

    pub fn freeze(&mut self) {
        self.set_flag_state(FROZEN, true);
    }

    pub fn thaw(&mut self) {
        self.set_flag_state(FROZEN, false);
    }

    pub fn is_locked(&self) -> bool {
        self.flags() & LOCKED != 0
    }

    /// Records on a locked layer are not editable in CAD applications.
    pub fn lock(&mut self) {
        self.set_flag_state(LOCKED, true);
    }

    pub fn unlock(&mut self) {
        self.set_flag_state(LOCKED, false);
    }

    fn raw_color(&self) -> i32 {
        self.dxf.get_int("color").unwrap_or(7)
    }

    pub fn is_on(&self) -> bool {
        self.raw_color() >= 0
    }

    pub fn is_off(&self) -> bool {
        !self.is_on()
    }

    pub fn on(&mut self) {
        let color = self.raw_color().abs();
        self.store_int("color", color);
    }

    pub fn off(&mut self) {
        let color = -self.raw_color().abs();
        self.store_int("color", color);
    }

    /// Color index independent of visibility.
    pub fn get_color(&self) -> i32 {
        self.raw_color().abs()
    }

    /// Sets the color index in 1..=255, keeping the visibility.
    pub fn set_color(&mut self, color: i32) -> Result<()> {
        if !(1..=255).contains(&color) {
            return Err(DxfError::InvalidValue(format!(
                "invalid layer color index {}, expected 1..=255",
                color
            )));
        }
        let color = if self.is_on() { color } else { -color };
        self.store_int("color", color);
        Ok(())
    }

    /// True color, `None` if not set.
    pub fn rgb(&self) -> Option<Rgb> {
        if self.dxf.has("true_color") {
            self.dxf.get_int("true_color").map(int2rgb)
        } else {
            None
        }
    }

    pub fn set_rgb(&mut self, rgb: (i32, i32, i32)) -> Result<()> {
        let rgb = Rgb::try_from(rgb)?;
        self.store_int("true_color", rgb2int(rgb));
        Ok(())
    }

    pub fn clear_rgb(&mut self) {
        self.dxf.discard("true_color");
    }

    pub fn description(&self) -> String {
        xdata::decode_description(&self.xdata)
    }

    /// Registers the description appid in `appids` if missing.
    pub fn set_description(&mut self, appids: &mut NameTable, text: &str) {
        xdata::register_appid(appids, DESCRIPTION_APPID);
        self.xdata.set(DESCRIPTION_APPID, xdata::encode_description(text));
    }

    /// 0.0 is opaque, 1.0 fully transparent.
    pub fn transparency(&self) -> f64 {
        xdata::decode_transparency(&self.xdata)
    }

    pub fn set_transparency(&mut self, appids: &mut NameTable, value: f64) -> Result<()> {
        let payload = xdata::encode_transparency(value)?;
        xdata::register_appid(appids, TRANSPARENCY_APPID);
        self.xdata.set(TRANSPARENCY_APPID, payload);
        Ok(())
    }

    pub fn linetype(&self) -> String {
        self.dxf.get_str("linetype").unwrap_or_default()
    }

    pub fn lineweight(&self) -> i32 {
        self.dxf.get_int("lineweight").unwrap_or(-3)
    }

    /// Viewport overrides persisted by the last commit.
    pub fn committed_overrides(&self) -> &OverrideMap {
        &self.committed_overrides
    }

    pub(crate) fn replace_committed_overrides(&mut self, overrides: OverrideMap) {
        self.committed_overrides = overrides;
    }

    /// Fills the handles every layer of a document must have.
    pub(crate) fn set_required_attributes(
        &mut self,
        materials: &NameTable,
        plotstyles: &NameTable,
    ) {
        if !self.dxf.has("material_handle") {
            if let Some(handle) = materials.handle_of("Global") {
                self.store("material_handle", AttrValue::Handle(handle.to_string()));
            }
        }
        if !self.dxf.has("plotstyle_handle") {
            if let Some(handle) = plotstyles.handle_of("Normal") {
                self.store("plotstyle_handle", AttrValue::Handle(handle.to_string()));
            }
        }
    }

    fn set_flag_state(&mut self, flag: i32, state: bool) {
        let flags = if state {
            self.flags() | flag
        } else {
            self.flags() & !flag
        };
        self.store_int("flags", flags);
    }

    /// Values reaching this point are valid by construction.
    fn store(&mut self, name: &str, value: AttrValue) {
        if let Some(def) = LAYER_SCHEMA.get(name) {
            self.dxf.unprotected_set(def, value);
        }
    }

    fn store_int(&mut self, name: &str, value: i32) {
        self.store(name, AttrValue::Int(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::split_group;
    use crate::tags::{Tag, TagCollector};
    use proptest::prelude::*;

    fn walls() -> Layer {
        let mut layer = Layer::new();
        layer.dxf.set("name", "WALLS".into()).unwrap();
        layer.dxf.set("color", (-5).into()).unwrap();
        layer
    }

    fn r2000_tags() -> Vec<Tag> {
        vec![
            Tag::new(0, "LAYER"),
            Tag::new(5, "1A"),
            Tag::new(330, "2"),
            Tag::new(100, "AcDbSymbolTableRecord"),
            Tag::new(100, "AcDbLayerTableRecord"),
            Tag::new(2, "WALLS"),
            Tag::new(70, 0),
            Tag::new(62, -5),
            Tag::new(6, "Continuous"),
            Tag::new(370, -3),
            Tag::new(390, "F"),
        ]
    }

    #[test]
    fn test_defaults() {
        let layer = Layer::new();
        assert_eq!(layer.name(), "0");
        assert_eq!(layer.get_color(), 7);
        assert!(layer.is_on());
        assert_eq!(layer.linetype(), "Continuous");
        assert_eq!(layer.lineweight(), -3);
        assert!(layer.rgb().is_none());
    }

    #[test]
    fn test_color_sign_is_visibility() {
        let mut layer = walls();
        assert!(!layer.is_on());
        assert_eq!(layer.get_color(), 5);
        layer.set_color(12).unwrap();
        assert_eq!(layer.dxf.get_int("color"), Some(-12));
        layer.on();
        assert_eq!(layer.dxf.get_int("color"), Some(12));
    }

    #[test]
    fn test_set_color_rejects_out_of_range() {
        let mut layer = walls();
        assert!(layer.set_color(0).is_err());
        assert!(layer.set_color(256).is_err());
        assert!(layer.set_color(-3).is_err());
        assert_eq!(layer.dxf.get_int("color"), Some(-5));
    }

    #[test]
    fn test_flags_preserve_reserved_bits() {
        let mut layer = Layer::new();
        layer.dxf.set("flags", 0b0101_0000.into()).unwrap();
        layer.freeze();
        layer.lock();
        assert!(layer.is_frozen());
        assert!(layer.is_locked());
        assert_eq!(layer.flags(), 0b0101_0101);
        layer.thaw();
        layer.unlock();
        assert_eq!(layer.flags(), 0b0101_0000);
    }

    #[test]
    fn test_rgb() {
        let mut layer = Layer::new();
        layer.set_rgb((12, 34, 56)).unwrap();
        assert_eq!(layer.rgb(), Some(Rgb::new(12, 34, 56)));
        assert!(layer.set_rgb((256, 0, 0)).is_err());
        assert_eq!(layer.rgb(), Some(Rgb::new(12, 34, 56)));
        layer.clear_rgb();
        assert!(layer.rgb().is_none());
    }

    #[test]
    fn test_description_registers_appid() {
        let mut appids = NameTable::new("appid");
        let mut layer = Layer::new();
        assert_eq!(layer.description(), "");
        layer.set_description(&mut appids, "outer walls");
        assert_eq!(layer.description(), "outer walls");
        assert!(appids.has_entry(DESCRIPTION_APPID));
    }

    #[test]
    fn test_transparency() {
        let mut appids = NameTable::new("appid");
        let mut layer = Layer::new();
        assert_eq!(layer.transparency(), 0.0);
        layer.set_transparency(&mut appids, 1.0).unwrap();
        assert_eq!(layer.transparency(), 1.0);
        assert!(appids.has_entry(TRANSPARENCY_APPID));
    }

    #[test]
    fn test_invalid_transparency_leaves_state_unchanged() {
        let mut appids = NameTable::new("appid");
        let mut layer = Layer::new();
        assert!(layer.set_transparency(&mut appids, 1.01).is_err());
        assert!(layer.xdata.is_empty());
        assert!(appids.is_empty());
    }

    #[test]
    fn test_load_repairs_invalid_color_and_lineweight() {
        let mut tags = r2000_tags();
        tags[7] = Tag::new(62, 0);
        tags[9] = Tag::new(370, -1);
        let group = split_group(&tags).unwrap();
        let layer = Layer::load(group, DxfVersion::R2000, CodecOptions::default()).unwrap();
        assert_eq!(layer.dxf.get_int("color"), Some(7));
        assert_eq!(layer.lineweight(), -3);
    }

    #[test]
    fn test_round_trip_r2000() {
        let tags = r2000_tags();
        let group = split_group(&tags).unwrap();
        let layer = Layer::load(group, DxfVersion::R2000, CodecOptions::default()).unwrap();
        let mut writer = TagCollector::new(DxfVersion::R2000);
        layer.export(&mut writer, CodecOptions::default()).unwrap();
        assert_eq!(writer.tags, tags);
    }

    #[test]
    fn test_legacy_export_has_no_markers_or_gated_codes() {
        let mut layer = walls();
        layer.dxf.set("plot", 0.into()).unwrap();
        let mut writer = TagCollector::new(DxfVersion::R12);
        layer.export(&mut writer, CodecOptions::default()).unwrap();
        assert!(!writer.has_code(100));
        assert!(!writer.has_code(290));
        assert!(!writer.has_code(370));
    }

    proptest! {
        #[test]
        fn color_magnitude_survives_visibility_toggles(m in 1i32..=255, visible in any::<bool>()) {
            let mut layer = Layer::new();
            layer.set_color(m).unwrap();
            if visible { layer.on() } else { layer.off() }
            prop_assert_eq!(layer.get_color(), m);
            prop_assert_eq!(layer.is_on(), visible);
        }

        #[test]
        fn set_color_keeps_visibility(m in 1i32..=255, visible in any::<bool>()) {
            let mut layer = Layer::new();
            if visible { layer.on() } else { layer.off() }
            layer.set_color(m).unwrap();
            prop_assert_eq!(layer.is_on(), visible);
            prop_assert_eq!(layer.get_color(), m);
        }
    }
}
