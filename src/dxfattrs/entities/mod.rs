//! # Records
//!
//! Every record owns one [`Namespace`] plus its extended data. The record
//! kinds known to this crate form a closed set, so they are modelled as the
//! [`Entity`] enum rather than trait objects:
//!
//! - [`Layer`]: the named layer table record, the main subject of this crate
//! - [`Viewport`]: carries a per-viewport list of frozen layers
//! - [`Graphic`]: LINE, POINT, CIRCLE, ARC and TEXT; they reference a layer
//!   by name
//! - [`Unsupported`]: anything else, kept as raw tags for round trips
//!
//! Record types are resolved once per decoded group through the static
//! [`registry`].

use crate::attributes::validation::{
    fix_lineweight, is_valid_aci, is_valid_layer_name, is_valid_lineweight, is_valid_table_name,
};
use crate::attributes::{AttributeDef, AttributeKind, Fixer, Namespace, TableRef, Validator};
use crate::codec::{self, CodecOptions};
use crate::error::Result;
use crate::store::Handle;
use crate::tables::NameTable;
use crate::tags::TagWriter;
use crate::version::DxfVersion;
use crate::xdata::XData;

pub mod graphic;
pub mod layer;
pub mod registry;
pub mod unsupported;
pub mod viewport;

pub use graphic::Graphic;
pub use layer::Layer;
pub use unsupported::Unsupported;
pub use viewport::Viewport;

/// Attributes shared by all records, written before the first marker.
pub(crate) const BASE_ATTRIBS: &[AttributeDef] = &[
    AttributeDef::new("handle", 5, AttributeKind::Handle),
    AttributeDef::new("owner", 330, AttributeKind::Handle).since(DxfVersion::R2000),
];

/// `AcDbEntity`: attributes of records placed in a drawing.
pub(crate) const ENTITY_ATTRIBS: &[AttributeDef] = &[
    AttributeDef::new("layer", 8, AttributeKind::Str)
        .default_str("0")
        .validator(Validator::Str(is_valid_layer_name))
        .refers_to(TableRef::Layer),
    AttributeDef::new("linetype", 6, AttributeKind::Str)
        .default_str("BYLAYER")
        .optional()
        .validator(Validator::Str(is_valid_table_name))
        .refers_to(TableRef::Linetype),
    AttributeDef::new("color", 62, AttributeKind::Int)
        .default_int(256)
        .optional()
        .validator(Validator::Int(is_valid_aci))
        .fixer(Fixer::ReturnDefault),
    AttributeDef::new("lineweight", 370, AttributeKind::Int)
        .default_int(-1)
        .since(DxfVersion::R2000)
        .optional()
        .validator(Validator::Int(is_valid_lineweight))
        .fixer(Fixer::Int(fix_lineweight)),
];

pub(crate) const ENTITY_MARKER: &str = "AcDbEntity";

#[derive(Debug, Clone)]
pub enum Entity {
    Layer(Layer),
    Viewport(Viewport),
    Graphic(Graphic),
    Unsupported(Unsupported),
}

impl Entity {
    pub fn dxftype(&self) -> &str {
        match self {
            Entity::Layer(_) => layer::DXFTYPE,
            Entity::Viewport(_) => viewport::DXFTYPE,
            Entity::Graphic(e) => e.dxftype(),
            Entity::Unsupported(e) => e.dxftype(),
        }
    }

    pub fn handle(&self) -> Option<Handle> {
        match self.dxf() {
            Some(dxf) => dxf.get_handle("handle"),
            None => match self {
                Entity::Unsupported(e) => e.handle(),
                _ => None,
            },
        }
    }

    /// Attribute namespace, `None` for records kept as raw tags.
    pub fn dxf(&self) -> Option<&Namespace> {
        match self {
            Entity::Layer(e) => Some(&e.dxf),
            Entity::Viewport(e) => Some(&e.dxf),
            Entity::Graphic(e) => Some(&e.dxf),
            Entity::Unsupported(_) => None,
        }
    }

    pub fn dxf_mut(&mut self) -> Option<&mut Namespace> {
        match self {
            Entity::Layer(e) => Some(&mut e.dxf),
            Entity::Viewport(e) => Some(&mut e.dxf),
            Entity::Graphic(e) => Some(&mut e.dxf),
            Entity::Unsupported(_) => None,
        }
    }

    pub fn xdata(&self) -> Option<&XData> {
        match self {
            Entity::Layer(e) => Some(&e.xdata),
            Entity::Viewport(e) => Some(&e.xdata),
            Entity::Graphic(e) => Some(&e.xdata),
            Entity::Unsupported(_) => None,
        }
    }

    pub fn as_layer(&self) -> Option<&Layer> {
        match self {
            Entity::Layer(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_layer_mut(&mut self) -> Option<&mut Layer> {
        match self {
            Entity::Layer(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_viewport(&self) -> Option<&Viewport> {
        match self {
            Entity::Viewport(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_viewport_mut(&mut self) -> Option<&mut Viewport> {
        match self {
            Entity::Viewport(e) => Some(e),
            _ => None,
        }
    }

    /// Writes the complete tag group, structure tag first.
    ///
    /// `layers` resolves the viewport frozen layer names back to handles.
    pub fn export<W: TagWriter + ?Sized>(
        &self,
        writer: &mut W,
        options: CodecOptions,
        layers: &NameTable,
    ) -> Result<()> {
        match self {
            Entity::Layer(e) => e.export(writer, options),
            Entity::Viewport(e) => e.export(writer, options, layers),
            Entity::Graphic(e) => e.export(writer, options),
            Entity::Unsupported(e) => {
                e.export(writer);
                Ok(())
            }
        }
    }
}

/// Writes all declared subclasses in order, then the undeclared ones.
pub(crate) fn export_namespace<W: TagWriter + ?Sized>(
    dxf: &Namespace,
    writer: &mut W,
    options: CodecOptions,
) -> Result<()> {
    for index in 0..dxf.schema().subclasses().len() {
        codec::export_subclass(dxf, writer, index, options)?;
    }
    codec::export_foreign_subclasses(dxf, writer);
    Ok(())
}
