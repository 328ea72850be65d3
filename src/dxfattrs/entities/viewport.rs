//! Viewport record.
//!
//! Besides its attributes a viewport stores the layers frozen in it as a list
//! of `(341, layer handle)` tags. The handles are resolved to layer names once
//! the layer table is known, and written back as handles on export.
//! Geometry codes are kept as unknown tags.

use super::{export_namespace, BASE_ATTRIBS, ENTITY_ATTRIBS, ENTITY_MARKER};
use crate::attributes::{AttributeDef, AttributeKind, Namespace, Schema, Subclass};
use crate::codec::{self, CodecOptions, TagGroup};
use crate::error::Result;
use crate::store::Handle;
use crate::tables::{name_key, NameTable};
use crate::tags::{Tag, TagValue, TagWriter};
use crate::version::DxfVersion;
use crate::xdata::XData;
use log::warn;
use once_cell::sync::Lazy;

pub const DXFTYPE: &str = "VIEWPORT";
const VIEWPORT_MARKER: &str = "AcDbViewport";
const FROZEN_LAYER_CODE: i32 = 341;

const VIEWPORT_ATTRIBS: &[AttributeDef] = &[
    AttributeDef::new("status", 68, AttributeKind::Int).default_int(0),
    AttributeDef::new("id", 69, AttributeKind::Int).default_int(2),
];

const SUBCLASSES: &[Subclass] = &[
    Subclass {
        marker: None,
        attributes: BASE_ATTRIBS,
    },
    Subclass {
        marker: Some(ENTITY_MARKER),
        attributes: ENTITY_ATTRIBS,
    },
    Subclass {
        marker: Some(VIEWPORT_MARKER),
        attributes: VIEWPORT_ATTRIBS,
    },
];

pub static VIEWPORT_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new(DXFTYPE, SUBCLASSES));

#[derive(Debug, Clone)]
pub struct Viewport {
    pub dxf: Namespace,
    pub xdata: XData,
    frozen_layers: Vec<String>,
    /// Frozen layer handles not resolved to a name yet
    unresolved: Vec<Handle>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            dxf: Namespace::new(&VIEWPORT_SCHEMA),
            xdata: XData::new(),
            frozen_layers: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn load(group: TagGroup<'_>, version: DxfVersion, options: CodecOptions) -> Result<Self> {
        let (frozen, body): (Vec<Tag>, Vec<Tag>) = group
            .body
            .iter()
            .cloned()
            .partition(|tag| tag.code == FROZEN_LAYER_CODE);
        Ok(Self {
            dxf: codec::load_namespace(&VIEWPORT_SCHEMA, &body, version, options),
            xdata: XData::from_tags(group.xdata)?,
            frozen_layers: Vec::new(),
            unresolved: frozen
                .iter()
                .filter_map(|tag| tag.value.as_str().map(str::to_ascii_uppercase))
                .collect(),
        })
    }

    /// Turns loaded frozen layer handles into names.
    ///
    /// Handles without a layer stay unresolved and are written back as read.
    pub fn resolve_frozen_layers(&mut self, layers: &NameTable) {
        self.resolve_known_layers(layers);
        for handle in &self.unresolved {
            warn!("VIEWPORT: frozen layer handle {} does not exist", handle);
        }
    }

    /// Like [`Self::resolve_frozen_layers`], but quiet about handles whose
    /// layer may still be loaded.
    pub fn resolve_known_layers(&mut self, layers: &NameTable) {
        let pending = std::mem::take(&mut self.unresolved);
        for handle in pending {
            match layers.name_of(&handle) {
                Some(name) => self.frozen_layers.push(name.to_string()),
                None => self.unresolved.push(handle),
            }
        }
    }

    pub fn has_unresolved_layers(&self) -> bool {
        !self.unresolved.is_empty()
    }

    pub fn export<W: TagWriter + ?Sized>(
        &self,
        writer: &mut W,
        options: CodecOptions,
        layers: &NameTable,
    ) -> Result<()> {
        writer.write_tag2(0, TagValue::Str(DXFTYPE.to_string()));
        export_namespace(&self.dxf, writer, options)?;
        if writer.dxfversion() > DxfVersion::R12 {
            for name in &self.frozen_layers {
                match layers.handle_of(name) {
                    Some(handle) => {
                        writer.write_tag2(FROZEN_LAYER_CODE, TagValue::Str(handle.to_string()))
                    }
                    None => warn!("VIEWPORT: frozen layer '{}' has no handle, skipped", name),
                }
            }
            for handle in &self.unresolved {
                writer.write_tag2(FROZEN_LAYER_CODE, TagValue::Str(handle.clone()));
            }
        }
        self.xdata.export(writer);
        Ok(())
    }

    pub fn frozen_layers(&self) -> &[String] {
        &self.frozen_layers
    }

    pub fn is_layer_frozen(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn freeze_layer(&mut self, name: &str) {
        if !self.is_layer_frozen(name) {
            self.frozen_layers.push(name.to_string());
        }
    }

    pub fn thaw_layer(&mut self, name: &str) {
        let name = name_key(name);
        self.frozen_layers.retain(|layer| name_key(layer) != name);
    }

    /// Rename hook, returns `true` if `old` was frozen in this viewport.
    pub fn rename_frozen_layer(&mut self, old: &str, new: &str) -> bool {
        match self.position(old) {
            Some(idx) => {
                self.frozen_layers[idx] = new.to_string();
                true
            }
            None => false,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name_key(name);
        self.frozen_layers.iter().position(|layer| name_key(layer) == name)
    }
}
