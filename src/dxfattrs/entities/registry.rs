//! Record type registry.
//!
//! Maps the structure tag of a group to the loader of its record type. The
//! map is built once, on first use, and consulted once per decoded group.
//! Unregistered types load as [`Unsupported`].

use super::{graphic, layer, viewport, Entity, Graphic, Layer, Unsupported, Viewport};
use crate::codec::{split_group, CodecOptions, TagGroup};
use crate::error::{DxfError, Result};
use crate::tags::Tag;
use crate::version::DxfVersion;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;

type Loader = fn(TagGroup<'_>, DxfVersion, CodecOptions) -> Result<Entity>;

fn load_layer(group: TagGroup<'_>, version: DxfVersion, options: CodecOptions) -> Result<Entity> {
    Layer::load(group, version, options).map(Entity::Layer)
}

fn load_viewport(
    group: TagGroup<'_>,
    version: DxfVersion,
    options: CodecOptions,
) -> Result<Entity> {
    Viewport::load(group, version, options).map(Entity::Viewport)
}

fn load_graphic(group: TagGroup<'_>, version: DxfVersion, options: CodecOptions) -> Result<Entity> {
    Graphic::load(group, version, options).map(Entity::Graphic)
}

static REGISTRY: Lazy<HashMap<&'static str, Loader>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Loader> = HashMap::new();
    map.insert(layer::DXFTYPE, load_layer);
    map.insert(viewport::DXFTYPE, load_viewport);
    for dxftype in graphic::DXFTYPES {
        map.insert(dxftype, load_graphic);
    }
    map
});

pub fn is_registered(dxftype: &str) -> bool {
    REGISTRY.contains_key(dxftype)
}

/// Decodes one complete tag group.
pub fn load(tags: &[Tag], version: DxfVersion, options: CodecOptions) -> Result<Entity> {
    let group = split_group(tags)?;
    match REGISTRY.get(group.dxftype) {
        Some(loader) => loader(group, version, options),
        None => {
            debug!("loading unsupported record type {}", group.dxftype);
            Ok(Entity::Unsupported(Unsupported::new(group.dxftype, tags.to_vec())))
        }
    }
}

/// Creates an empty record of a registered type.
pub fn create(dxftype: &str) -> Result<Entity> {
    match dxftype {
        layer::DXFTYPE => Ok(Entity::Layer(Layer::new())),
        viewport::DXFTYPE => Ok(Entity::Viewport(Viewport::new())),
        _ if graphic::DXFTYPES.contains(&dxftype) => Graphic::new(dxftype).map(Entity::Graphic),
        _ => Err(DxfError::InvalidValue(format!(
            "cannot create record of unregistered type {}",
            dxftype
        ))),
    }
}
