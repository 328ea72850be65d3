//! # Rename Consistency
//!
//! Layers are referenced by name from other records, so renaming one means
//! rewriting every reference. [`rename_layer`] does that in order:
//!
//! 1. Validate the new name (character set)
//! 2. Reject a case-insensitive collision with a different layer
//! 3. Reject renaming the protected layers `0` and `Defpoints`
//! 4. Move the layer table key from the old to the new name
//! 5. Rewrite every attribute declared as a layer reference whose value
//!    equals the old name, ignoring case
//! 6. Run per-type hooks: viewports rename their frozen layer lists
//!
//! Steps 1-3 fail before anything is changed.
//!
//! ## Known Gaps
//!
//! Records kept as raw tags cannot be rewritten. LAYER_FILTER and
//! LAYER_INDEX records, and raw records carrying the old name as a layer
//! reference, still point to the old name afterwards. The rename succeeds
//! anyway; the affected handles are logged and listed in
//! [`RenameReport::unresolved`].
//!
//! ## Cost
//!
//! There is no reverse index from names to referencing records. Every rename
//! visits the whole entity database once, O(n) in its size, and blocks until
//! done. Bulk renames should be batched by the caller.

use crate::attributes::validation::validate_layer_name;
use crate::attributes::{AttrValue, TableRef};
use crate::document::Document;
use crate::entities::Entity;
use crate::error::{DxfError, Result};
use crate::store::{EntityStore, Handle};
use crate::tables::{name_key, same_name};
use log::{info, warn};

/// Layers that can never be renamed.
pub const PROTECTED_LAYER_NAMES: [&str; 2] = ["0", "Defpoints"];

pub fn is_protected_layer_name(name: &str) -> bool {
    PROTECTED_LAYER_NAMES
        .iter()
        .any(|protected| same_name(protected, name))
}

/// Outcome of a successful rename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub old_name: String,
    pub new_name: String,
    /// Records whose layer reference attributes were rewritten
    pub updated: Vec<Handle>,
    /// Viewports whose frozen layer list was rewritten
    pub viewports: Vec<Handle>,
    /// Records that may still reference the old name
    pub unresolved: Vec<Handle>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

enum Change {
    Attribute(Handle, &'static str),
    FrozenLayer(Handle),
}

/// Renames the layer stored under `handle`, see the module docs.
pub fn rename_layer<S: EntityStore>(
    doc: &mut Document<S>,
    handle: &str,
    new_name: &str,
) -> Result<RenameReport> {
    let old_name = doc
        .entitydb
        .get(handle)
        .and_then(Entity::as_layer)
        .map(|layer| layer.name())
        .ok_or_else(|| DxfError::EntityNotFound(handle.to_string()))?;

    validate_layer_name(new_name).map_err(|e| {
        DxfError::InvalidIdentifier(format!("cannot rename layer to '{}': {}", new_name, e))
    })?;
    let collides = doc.layers.get(new_name).is_some_and(|entry| {
        !entry
            .handle
            .as_deref()
            .is_some_and(|h| h.eq_ignore_ascii_case(handle))
    });
    if collides {
        return Err(DxfError::InvalidIdentifier(format!(
            "layer '{}' already exists",
            new_name
        )));
    }
    if is_protected_layer_name(&old_name) {
        return Err(DxfError::InvalidIdentifier(format!(
            "layer '{}' cannot be renamed",
            old_name
        )));
    }

    doc.layers.replace(&old_name, new_name)?;
    let renamed = doc
        .entitydb
        .get_mut(handle)
        .and_then(Entity::dxf_mut)
        .map(|dxf| dxf.set("name", AttrValue::Str(new_name.to_string())));
    if let Some(Err(e)) = renamed {
        doc.layers.replace(new_name, &old_name)?;
        return Err(e);
    }

    let mut report = RenameReport {
        old_name: old_name.clone(),
        new_name: new_name.to_string(),
        ..Default::default()
    };

    // collect first, the database is not mutated while scanning
    let changes = collect_changes(doc, handle, &old_name, &mut report);
    for change in changes {
        match change {
            Change::Attribute(target, attribute) => {
                if let Some(dxf) = doc.entitydb.get_mut(&target).and_then(Entity::dxf_mut) {
                    dxf.set(attribute, AttrValue::Str(new_name.to_string()))?;
                }
                if report.updated.last() != Some(&target) {
                    report.updated.push(target);
                }
            }
            Change::FrozenLayer(target) => {
                let viewport = doc.entitydb.get_mut(&target).and_then(Entity::as_viewport_mut);
                if let Some(viewport) = viewport {
                    viewport.rename_frozen_layer(&old_name, new_name);
                }
                report.viewports.push(target);
            }
        }
    }

    info!(
        "renamed layer '{}' to '{}': {} references, {} viewports, {} unresolved",
        report.old_name,
        report.new_name,
        report.updated.len(),
        report.viewports.len(),
        report.unresolved.len()
    );
    Ok(report)
}

fn collect_changes<S: EntityStore>(
    doc: &Document<S>,
    renamed: &str,
    old_name: &str,
    report: &mut RenameReport,
) -> Vec<Change> {
    let old_key = name_key(old_name);
    let mut changes = Vec::new();
    for handle in doc.entitydb.handles() {
        if handle.eq_ignore_ascii_case(renamed) {
            continue;
        }
        let Some(entity) = doc.entitydb.get(&handle) else {
            continue;
        };
        if let Some(dxf) = entity.dxf() {
            for def in dxf.schema().references_to(TableRef::Layer) {
                let matches = dxf
                    .get_str(def.name)
                    .is_some_and(|value| name_key(&value) == old_key);
                if matches {
                    changes.push(Change::Attribute(handle.clone(), def.name));
                }
            }
        }
        match entity {
            Entity::Viewport(viewport) if viewport.is_layer_frozen(old_name) => {
                changes.push(Change::FrozenLayer(handle.clone()));
            }
            Entity::Unsupported(record) if record.references_layer(old_name) => {
                warn!(
                    "renaming layer '{}': {} {} not updated",
                    old_name,
                    record.dxftype(),
                    handle
                );
                report.unresolved.push(handle.clone());
            }
            _ => {}
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::DocumentFixture;
    use crate::tags::Tag;

    fn walls_doc() -> Document {
        DocumentFixture::new()
            .with_layer("Walls")
            .with_layer("Doors")
            .with_graphics_on("LINE", "Walls", 2)
            .with_graphics_on("CIRCLE", "walls", 1)
            .with_graphics_on("TEXT", "Doors", 1)
            .with_viewport(&["WALLS", "Doors"])
            .doc
    }

    fn layer_refs(doc: &Document, name: &str) -> usize {
        doc.entitydb
            .handles()
            .iter()
            .filter_map(|h| doc.entitydb.get(h))
            .filter_map(|e| e.dxf()?.get_str("layer"))
            .filter(|layer| layer.eq_ignore_ascii_case(name))
            .count()
    }

    #[test]
    fn test_rename_updates_all_references() {
        let mut doc = walls_doc();
        let report = doc.rename_layer("Walls", "Wall").unwrap();
        assert_eq!(report.updated.len(), 3);
        assert_eq!(report.viewports.len(), 1);
        assert!(report.is_complete());
        assert_eq!(layer_refs(&doc, "Walls"), 0);
        assert_eq!(layer_refs(&doc, "Wall"), 3);
        assert_eq!(layer_refs(&doc, "Doors"), 1);
        assert!(doc.layers.has_entry("Wall"));
        assert!(!doc.layers.has_entry("Walls"));
        assert_eq!(doc.layer("wall").unwrap().name(), "Wall");
    }

    #[test]
    fn test_rename_updates_viewport_frozen_list() {
        let mut doc = walls_doc();
        let report = doc.rename_layer("Walls", "Wall").unwrap();
        let viewport = doc.viewport(&report.viewports[0]).unwrap();
        assert!(viewport.is_layer_frozen("Wall"));
        assert!(!viewport.is_layer_frozen("Walls"));
        assert!(viewport.is_layer_frozen("Doors"));
    }

    #[test]
    fn test_rename_to_case_variant() {
        let mut doc = walls_doc();
        doc.rename_layer("Walls", "WALLS").unwrap();
        assert_eq!(doc.layer("walls").unwrap().name(), "WALLS");
        assert_eq!(layer_refs(&doc, "WALLS"), 3);
    }

    #[test]
    fn test_rejects_invalid_characters() {
        let mut doc = walls_doc();
        let err = doc.rename_layer("Walls", "Wall/1").unwrap_err();
        assert!(matches!(err, DxfError::InvalidIdentifier(_)));
        assert!(err.to_string().contains("<>/"));
        assert!(doc.layers.has_entry("Walls"));
    }

    #[test]
    fn test_rejects_collision() {
        let mut doc = walls_doc();
        assert!(matches!(
            doc.rename_layer("Walls", "DOORS"),
            Err(DxfError::InvalidIdentifier(_))
        ));
        assert_eq!(layer_refs(&doc, "Walls"), 3);
    }

    #[test]
    fn test_rejects_protected_layers() {
        let mut doc = DocumentFixture::new().with_layer("DEFPOINTS").doc;
        assert!(matches!(
            doc.rename_layer("0", "Zero"),
            Err(DxfError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            doc.rename_layer("defpoints", "Points"),
            Err(DxfError::InvalidIdentifier(_))
        ));
        assert!(doc.layers.has_entry("0"));
        assert!(doc.layers.has_entry("Defpoints"));
    }

    #[test]
    fn test_unsupported_records_are_reported() {
        let mut doc = walls_doc();
        let filter = doc
            .load_entity(&[
                Tag::new(0, "LAYER_FILTER"),
                Tag::new(5, "FFF"),
                Tag::new(8, "Walls"),
            ])
            .unwrap();
        let report = doc.rename_layer("Walls", "Wall").unwrap();
        assert_eq!(report.unresolved, vec![filter]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_unknown_handle() {
        let mut doc = walls_doc();
        assert!(matches!(
            rename_layer(&mut doc, "ABCDEF", "X"),
            Err(DxfError::EntityNotFound(_))
        ));
    }
}
