//! # Document
//!
//! A [`Document`] wires the name tables to the entity database. It is the
//! context every operation with document-wide effects runs in: creating
//! layers, renaming them, writing extended data that needs an appid entry,
//! and editing viewport overrides.
//!
//! ## Tables
//!
//! | Table | Filled from | Seeded entries |
//! |-------|-------------|----------------|
//! | `layers` | LAYER records | `0` |
//! | `linetypes` | LTYPE records | `ByBlock`, `ByLayer`, `Continuous` |
//! | `appids` | APPID records | `ACAD` |
//! | `plotstyles` | - | `Normal` |
//! | `materials` | MATERIAL records | `ByLayer`, `ByBlock`, `Global` |
//!
//! New documents are seeded, loaded documents contain what was loaded.
//!
//! ## Field Access
//!
//! The tables and the entity database are public fields. Operations that
//! need a record and a table at once borrow them separately, e.g.
//! `layer.set_description(&mut doc.appids, ..)` after taking the layer from
//! `doc.entitydb`.

use crate::attributes::validation::validate_layer_name;
use crate::attributes::{AttrValue, Namespace};
use crate::codec::CodecOptions;
use crate::config::DxfConfig;
use crate::consistency::{self, RenameReport};
use crate::entities::{registry, Entity, Graphic, Layer, Viewport};
use crate::error::{DxfError, Result};
use crate::overrides::ViewportOverrides;
use crate::store::{EntityStore, Handle, InMemoryEntityDb};
use crate::tables::NameTable;
use crate::tags::{Tag, TagWriter};
use crate::version::DxfVersion;
use log::{debug, warn};

const SEED_LINETYPES: [&str; 3] = ["ByBlock", "ByLayer", "Continuous"];
const SEED_MATERIALS: [&str; 3] = ["ByLayer", "ByBlock", "Global"];

pub struct Document<S: EntityStore = InMemoryEntityDb> {
    dxfversion: DxfVersion,
    pub config: DxfConfig,
    pub layers: NameTable,
    pub linetypes: NameTable,
    pub appids: NameTable,
    pub plotstyles: NameTable,
    pub materials: NameTable,
    pub entitydb: S,
}

impl Default for Document<InMemoryEntityDb> {
    fn default() -> Self {
        Self::new()
    }
}

impl Document<InMemoryEntityDb> {
    pub fn new() -> Self {
        Self::with_config(DxfConfig::default())
    }

    pub fn with_config(config: DxfConfig) -> Self {
        Self::with_store(InMemoryEntityDb::new(), config)
    }

    /// Loads complete tag groups, one per record.
    pub fn load(groups: &[Vec<Tag>], version: DxfVersion, config: DxfConfig) -> Result<Self> {
        Self::load_into(InMemoryEntityDb::new(), groups, version, config)
    }
}

impl<S: EntityStore> Document<S> {
    fn empty(store: S, version: DxfVersion, config: DxfConfig) -> Self {
        Self {
            dxfversion: version,
            config,
            layers: NameTable::with_validator("layer", validate_layer_name),
            linetypes: NameTable::new("linetype"),
            appids: NameTable::new("appid"),
            plotstyles: NameTable::new("plotstyle"),
            materials: NameTable::new("material"),
            entitydb: store,
        }
    }

    /// New, seeded document in the configured version.
    pub fn with_store(store: S, config: DxfConfig) -> Self {
        let version = config.dxfversion;
        let mut doc = Self::empty(store, version, config);
        doc.seed();
        doc
    }

    pub fn load_into(
        store: S,
        groups: &[Vec<Tag>],
        version: DxfVersion,
        config: DxfConfig,
    ) -> Result<Self> {
        let mut doc = Self::empty(store, version, config);
        for group in groups {
            doc.load_entity(group)?;
        }
        doc.resolve_references();
        Ok(doc)
    }

    fn seed(&mut self) {
        for name in SEED_LINETYPES {
            let handle = self.entitydb.next_handle();
            self.linetypes.ensure(name, Some(handle));
        }
        self.appids.ensure("ACAD", None);
        let handle = self.entitydb.next_handle();
        self.plotstyles.ensure("Normal", Some(handle));
        for name in SEED_MATERIALS {
            let handle = self.entitydb.next_handle();
            self.materials.ensure(name, Some(handle));
        }
        let mut layer = Layer::new();
        let handle = self.entitydb.next_handle();
        assign_handle(&mut layer.dxf, &handle);
        layer.set_required_attributes(&self.materials, &self.plotstyles);
        self.layers.ensure(&layer.name(), Some(handle.clone()));
        self.entitydb.insert(handle, Entity::Layer(layer));
    }

    pub fn dxfversion(&self) -> DxfVersion {
        self.dxfversion
    }

    pub fn options(&self) -> CodecOptions {
        CodecOptions::from(&self.config)
    }

    /// Decodes one tag group and stores it. Returns the record handle.
    pub fn load_entity(&mut self, tags: &[Tag]) -> Result<Handle> {
        let mut entity = registry::load(tags, self.dxfversion, self.options())?;
        let handle = match entity.handle() {
            Some(handle) => handle,
            None => {
                let handle = self.entitydb.next_handle();
                if let Some(dxf) = entity.dxf_mut() {
                    dxf.set("handle", AttrValue::Handle(handle.clone()))?;
                }
                handle
            }
        };
        self.register_names(&entity, &handle);
        match &mut entity {
            Entity::Viewport(viewport) => viewport.resolve_known_layers(&self.layers),
            Entity::Layer(_) => self.resolve_pending_viewports(),
            _ => {}
        }
        self.entitydb.insert(handle.clone(), entity);
        Ok(handle)
    }

    /// Viewports loaded before a layer they freeze pick it up here.
    fn resolve_pending_viewports(&mut self) {
        for handle in self.entitydb.handles() {
            let viewport = self.entitydb.get_mut(&handle).and_then(Entity::as_viewport_mut);
            if let Some(viewport) = viewport.filter(|vp| vp.has_unresolved_layers()) {
                viewport.resolve_known_layers(&self.layers);
            }
        }
    }

    /// Table entries for loaded records.
    fn register_names(&mut self, entity: &Entity, handle: &str) {
        match entity {
            Entity::Layer(layer) => {
                let name = layer.name();
                if !self.layers.ensure(&name, Some(handle.to_string())) {
                    warn!("duplicate layer name '{}' ({}), keeping the first", name, handle);
                }
            }
            Entity::Unsupported(record) => {
                let table = match record.dxftype() {
                    "LTYPE" => &mut self.linetypes,
                    "APPID" => &mut self.appids,
                    "MATERIAL" => &mut self.materials,
                    _ => return,
                };
                if let Some(name) = record.name() {
                    table.ensure(name, Some(handle.to_string()));
                }
            }
            _ => {}
        }
    }

    fn resolve_references(&mut self) {
        for handle in self.entitydb.handles() {
            let viewport = self.entitydb.get_mut(&handle).and_then(Entity::as_viewport_mut);
            if let Some(viewport) = viewport {
                viewport.resolve_frozen_layers(&self.layers);
            }
        }
    }

    /// Creates a layer with the document's required attributes.
    pub fn new_layer(&mut self, name: &str) -> Result<Handle> {
        let mut layer = Layer::new();
        layer
            .dxf
            .set("name", AttrValue::Str(name.to_string()))
            .map_err(|_| invalid_layer_name(name))?;
        self.add_entity(Entity::Layer(layer))
    }

    /// Stores a new record under a fresh handle.
    ///
    /// Layers are entered into the layer table; their name must be unique.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<Handle> {
        if let Entity::Layer(layer) = &entity {
            let name = layer.name();
            validate_layer_name(&name).map_err(|_| invalid_layer_name(&name))?;
            if self.layers.has_entry(&name) {
                return Err(DxfError::InvalidIdentifier(format!(
                    "layer '{}' already exists",
                    name
                )));
            }
        }
        let handle = self.entitydb.next_handle();
        if let Some(dxf) = entity.dxf_mut() {
            assign_handle(dxf, &handle);
        }
        if let Entity::Layer(layer) = &mut entity {
            layer.set_required_attributes(&self.materials, &self.plotstyles);
            self.layers.add(&layer.name(), Some(handle.clone()))?;
        }
        self.entitydb.insert(handle.clone(), entity);
        Ok(handle)
    }

    /// Adds a LINE, POINT, CIRCLE, ARC or TEXT placed on `layer`.
    pub fn add_graphic(&mut self, dxftype: &str, layer: &str) -> Result<Handle> {
        let mut graphic = Graphic::new(dxftype)?;
        graphic.set_layer(layer)?;
        self.add_entity(Entity::Graphic(graphic))
    }

    pub fn add_viewport(&mut self) -> Result<Handle> {
        self.add_entity(Entity::Viewport(Viewport::new()))
    }

    /// Removes a record; layers also leave the layer table.
    pub fn delete_entity(&mut self, handle: &str) -> Option<Entity> {
        let entity = self.entitydb.remove(handle)?;
        if let Entity::Layer(layer) = &entity {
            let name = layer.name();
            let owned = self
                .layers
                .handle_of(&name)
                .is_some_and(|h| h.eq_ignore_ascii_case(handle));
            if owned {
                self.layers.remove(&name);
            }
        }
        Some(entity)
    }

    pub fn get(&self, handle: &str) -> Option<&Entity> {
        self.entitydb.get(handle)
    }

    pub fn layer_handle(&self, name: &str) -> Option<Handle> {
        self.layers.handle_of(name).map(str::to_string)
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        let handle = self.layers.handle_of(name)?;
        self.entitydb.get(handle)?.as_layer()
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        let handle = self.layer_handle(name)?;
        self.entitydb.get_mut(&handle)?.as_layer_mut()
    }

    pub fn viewport(&self, handle: &str) -> Option<&Viewport> {
        self.entitydb.get(handle)?.as_viewport()
    }

    pub fn viewport_mut(&mut self, handle: &str) -> Option<&mut Viewport> {
        self.entitydb.get_mut(handle)?.as_viewport_mut()
    }

    pub fn set_layer_description(&mut self, name: &str, text: &str) -> Result<()> {
        let handle = self
            .layer_handle(name)
            .ok_or_else(|| DxfError::TableEntryNotFound(format!("layer '{}'", name)))?;
        let layer = self
            .entitydb
            .get_mut(&handle)
            .and_then(Entity::as_layer_mut)
            .ok_or_else(|| DxfError::EntityNotFound(handle.clone()))?;
        layer.set_description(&mut self.appids, text);
        Ok(())
    }

    pub fn set_layer_transparency(&mut self, name: &str, value: f64) -> Result<()> {
        let handle = self
            .layer_handle(name)
            .ok_or_else(|| DxfError::TableEntryNotFound(format!("layer '{}'", name)))?;
        let layer = self
            .entitydb
            .get_mut(&handle)
            .and_then(Entity::as_layer_mut)
            .ok_or_else(|| DxfError::EntityNotFound(handle.clone()))?;
        layer.set_transparency(&mut self.appids, value)
    }

    /// Renames a layer and every known reference to it.
    ///
    /// Visits every record of the entity database.
    pub fn rename_layer(&mut self, name: &str, new_name: &str) -> Result<RenameReport> {
        let handle = self
            .layer_handle(name)
            .ok_or_else(|| DxfError::TableEntryNotFound(format!("layer '{}'", name)))?;
        consistency::rename_layer(self, &handle, new_name)
    }

    /// Opens the viewport override store of a layer.
    pub fn viewport_overrides(&mut self, layer: &str) -> Result<ViewportOverrides<'_, S>> {
        let handle = self
            .layer_handle(layer)
            .ok_or_else(|| DxfError::TableEntryNotFound(format!("layer '{}'", layer)))?;
        ViewportOverrides::new(self, &handle)
    }

    /// Writes all records in handle order.
    pub fn export<W: TagWriter + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let options = self.options();
        for handle in self.entitydb.handles() {
            if let Some(entity) = self.entitydb.get(&handle) {
                entity.export(writer, options, &self.layers)?;
            }
        }
        Ok(())
    }

    pub fn export_entity<W: TagWriter + ?Sized>(&self, handle: &str, writer: &mut W) -> Result<()> {
        let entity = self
            .entitydb
            .get(handle)
            .ok_or_else(|| DxfError::EntityNotFound(handle.to_string()))?;
        entity.export(writer, self.options(), &self.layers)
    }
}

fn assign_handle(dxf: &mut Namespace, handle: &str) {
    if dxf.set("handle", AttrValue::Handle(handle.to_string())).is_err() {
        debug!("{} has no handle attribute", dxf.schema().dxftype);
    }
}

fn invalid_layer_name(name: &str) -> DxfError {
    match validate_layer_name(name) {
        Err(e) => DxfError::InvalidIdentifier(format!("invalid layer name '{}': {}", name, e)),
        Ok(()) => DxfError::InvalidIdentifier(format!("invalid layer name '{}'", name)),
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub struct DocumentFixture {
        pub doc: Document,
    }

    impl Default for DocumentFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DocumentFixture {
        pub fn new() -> Self {
            Self {
                doc: Document::new(),
            }
        }

        pub fn with_layer(mut self, name: &str) -> Self {
            self.doc.new_layer(name).unwrap();
            self
        }

        pub fn with_graphics_on(mut self, dxftype: &str, layer: &str, count: usize) -> Self {
            for _ in 0..count {
                self.doc.add_graphic(dxftype, layer).unwrap();
            }
            self
        }

        /// Adds a viewport with the given layers frozen.
        pub fn with_viewport(mut self, frozen: &[&str]) -> Self {
            let handle = self.doc.add_viewport().unwrap();
            let viewport = self.doc.viewport_mut(&handle).unwrap();
            for layer in frozen {
                viewport.freeze_layer(layer);
            }
            self
        }

        pub fn handles_of(&self, dxftype: &str) -> Vec<Handle> {
            self.doc
                .entitydb
                .handles()
                .into_iter()
                .filter(|h| self.doc.entitydb.get(h).is_some_and(|e| e.dxftype() == dxftype))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::DocumentFixture;
    use super::*;
    use crate::tags::TagCollector;

    #[test]
    fn test_new_document_is_seeded() {
        let doc = Document::new();
        assert!(doc.layers.has_entry("0"));
        assert!(doc.linetypes.has_entry("continuous"));
        assert!(doc.appids.has_entry("ACAD"));
        assert!(doc.plotstyles.has_entry("Normal"));
        assert!(doc.materials.has_entry("Global"));
        assert_eq!(doc.dxfversion(), DxfVersion::R2013);
    }

    #[test]
    fn test_new_layer_sets_required_handles() {
        let mut doc = Document::new();
        let handle = doc.new_layer("Walls").unwrap();
        let layer = doc.layer("WALLS").unwrap();
        assert_eq!(layer.handle().as_deref(), Some(handle.as_str()));
        assert_eq!(
            layer.dxf.get_handle("material_handle").as_deref(),
            doc.materials.handle_of("Global")
        );
        assert_eq!(
            layer.dxf.get_handle("plotstyle_handle").as_deref(),
            doc.plotstyles.handle_of("Normal")
        );
    }

    #[test]
    fn test_new_layer_rejects_duplicates_and_bad_names() {
        let mut doc = DocumentFixture::new().with_layer("Walls").doc;
        assert!(matches!(
            doc.new_layer("walls"),
            Err(DxfError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            doc.new_layer("a?b"),
            Err(DxfError::InvalidIdentifier(_))
        ));
        assert!(doc.new_layer("*ADSK_SYSTEM").is_ok());
    }

    #[test]
    fn test_delete_layer_leaves_table() {
        let mut doc = DocumentFixture::new().with_layer("Walls").doc;
        let handle = doc.layer_handle("Walls").unwrap();
        assert!(doc.delete_entity(&handle).is_some());
        assert!(!doc.layers.has_entry("Walls"));
        assert!(doc.get(&handle).is_none());
    }

    #[test]
    fn test_description_and_transparency_register_appids() {
        let mut doc = DocumentFixture::new().with_layer("Walls").doc;
        doc.set_layer_description("Walls", "outer walls").unwrap();
        doc.set_layer_transparency("Walls", 0.5).unwrap();
        assert!(doc.appids.has_entry("AcAecLayerStandard"));
        assert!(doc.appids.has_entry("AcCmTransparency"));
        assert_eq!(doc.layer("Walls").unwrap().description(), "outer walls");
        assert!(doc.set_layer_transparency("Walls", 2.0).is_err());
        assert!(doc.set_layer_description("Doors", "x").is_err());
    }

    #[test]
    fn test_load_registers_table_entries() {
        let groups = vec![
            vec![Tag::new(0, "LTYPE"), Tag::new(5, "14"), Tag::new(2, "DASHED")],
            vec![
                Tag::new(0, "LAYER"),
                Tag::new(5, "20"),
                Tag::new(2, "Walls"),
                Tag::new(62, 3),
            ],
            vec![Tag::new(0, "LAYER"), Tag::new(5, "21"), Tag::new(2, "WALLS")],
        ];
        let doc = Document::load(&groups, DxfVersion::R12, DxfConfig::default()).unwrap();
        assert!(doc.linetypes.has_entry("dashed"));
        assert_eq!(doc.layer_handle("walls").as_deref(), Some("20"));
        assert_eq!(doc.entitydb.len(), 3);
    }

    #[test]
    fn test_load_assigns_missing_handles() {
        let groups = vec![vec![Tag::new(0, "LINE"), Tag::new(8, "0")]];
        let doc = Document::load(&groups, DxfVersion::R12, DxfConfig::default()).unwrap();
        let handle = doc.entitydb.handles().pop().unwrap();
        assert_eq!(doc.get(&handle).unwrap().handle(), Some(handle));
    }

    fn viewport_freezing(handle: &str) -> Vec<Tag> {
        vec![
            Tag::new(0, "VIEWPORT"),
            Tag::new(100, "AcDbEntity"),
            Tag::new(8, "0"),
            Tag::new(100, "AcDbViewport"),
            Tag::new(341, handle),
        ]
    }

    #[test]
    fn test_load_entity_resolves_viewport_frozen_layers() {
        let mut doc = DocumentFixture::new().with_layer("Walls").doc;
        let walls = doc.layer_handle("Walls").unwrap();
        let vp = doc.load_entity(&viewport_freezing(&walls)).unwrap();
        assert!(doc.viewport(&vp).unwrap().is_layer_frozen("Walls"));
        assert!(doc.viewport_overrides("Walls").unwrap().is_frozen(&vp));

        let report = doc.rename_layer("Walls", "Wall").unwrap();
        assert_eq!(report.viewports, vec![vp]);
    }

    #[test]
    fn test_layer_loaded_after_viewport_is_resolved() {
        let mut doc = Document::new();
        let vp = doc.load_entity(&viewport_freezing("7F")).unwrap();
        assert!(doc.viewport(&vp).unwrap().has_unresolved_layers());

        doc.load_entity(&[Tag::new(0, "LAYER"), Tag::new(5, "7F"), Tag::new(2, "Doors")])
            .unwrap();
        let viewport = doc.viewport(&vp).unwrap();
        assert!(viewport.is_layer_frozen("DOORS"));
        assert!(!viewport.has_unresolved_layers());
    }

    #[test]
    fn test_export_all_records() {
        let doc = DocumentFixture::new()
            .with_layer("Walls")
            .with_graphics_on("LINE", "Walls", 2)
            .doc;
        let mut writer = TagCollector::new(DxfVersion::R2000);
        doc.export(&mut writer).unwrap();
        let structures: Vec<_> = writer.tags.iter().filter(|t| t.is_structure()).collect();
        assert_eq!(structures.len(), 4);
    }
}
