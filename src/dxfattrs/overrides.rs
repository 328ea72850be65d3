//! # Viewport Overrides
//!
//! A layer can look different in each viewport: color, true color,
//! transparency, linetype, lineweight and the frozen state can be overridden
//! per viewport handle. [`ViewportOverrides`] is an editing session over the
//! overrides of one layer.
//!
//! ## States
//!
//! For each viewport handle:
//!
//! - **Unmaterialized**: no entry. Getters return the layer's current
//!   settings, and the frozen state read live from the viewport's frozen
//!   layer list.
//! - **Materialized**: the first setter call copies those defaults into an
//!   entry and changes it. Reads never materialize.
//!
//! Only [`ViewportOverrides::discard`] removes an entry again.
//!
//! ## Persistence
//!
//! Changes live in the session until [`ViewportOverrides::commit`], which
//! replaces the layer's committed overrides with the whole session map in one
//! step. A session that is dropped without commit loses its changes. A new
//! session starts from the last committed state.
//!
//! Committed overrides are kept for the lifetime of the document only. They
//! are not written to tags, because the layout of the layer's extension
//! dictionary holding them is not implemented.

use crate::attributes::validation::{
    is_valid_layer_color_index, is_valid_layer_lineweight, LINEWEIGHT_DEFAULT,
};
use crate::colors::Rgb;
use crate::document::Document;
use crate::entities::{Entity, Layer};
use crate::error::{DxfError, Result};
use crate::store::{EntityStore, Handle};
use log::debug;
use std::collections::BTreeMap;

/// Settings of one layer in one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOverrides {
    /// Signed color index, negative is off
    pub aci: i32,
    pub rgb: Option<Rgb>,
    pub transparency: f64,
    pub linetype: String,
    pub lineweight: i32,
    pub frozen: bool,
}

impl Default for LayerOverrides {
    fn default() -> Self {
        Self {
            aci: 7,
            rgb: None,
            transparency: 0.0,
            linetype: "Continuous".to_string(),
            lineweight: LINEWEIGHT_DEFAULT,
            frozen: false,
        }
    }
}

/// Overrides by viewport handle.
pub type OverrideMap = BTreeMap<Handle, LayerOverrides>;

pub struct ViewportOverrides<'a, S: EntityStore> {
    doc: &'a mut Document<S>,
    layer: Handle,
    overrides: OverrideMap,
}

impl<'a, S: EntityStore> ViewportOverrides<'a, S> {
    /// Opens a session over the layer stored under `layer`.
    pub fn new(doc: &'a mut Document<S>, layer: &str) -> Result<Self> {
        let overrides = doc
            .entitydb
            .get(layer)
            .and_then(Entity::as_layer)
            .map(|layer| layer.committed_overrides().clone())
            .ok_or_else(|| DxfError::EntityNotFound(layer.to_string()))?;
        Ok(Self {
            doc,
            layer: layer.to_string(),
            overrides,
        })
    }

    fn base_layer(&self) -> Option<&Layer> {
        self.doc.entitydb.get(&self.layer)?.as_layer()
    }

    /// `true` if `vp` has an entry, or if any entry exists when `vp` is `None`.
    pub fn has_overrides(&self, vp: Option<&str>) -> bool {
        match vp {
            Some(vp) => self.overrides.contains_key(vp),
            None => !self.overrides.is_empty(),
        }
    }

    /// Viewport handles with an entry.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }

    /// The layer's current settings.
    pub fn default_settings(&self, frozen: bool) -> LayerOverrides {
        match self.base_layer() {
            Some(layer) => LayerOverrides {
                aci: layer.get_color(),
                rgb: layer.rgb(),
                transparency: layer.transparency(),
                linetype: layer.linetype(),
                lineweight: layer.lineweight(),
                frozen,
            },
            None => LayerOverrides {
                frozen,
                ..Default::default()
            },
        }
    }

    /// Reads the frozen list of viewport `vp`, `false` if it is no viewport.
    pub fn is_layer_frozen_in_vp(&self, vp: &str) -> bool {
        let Some(layer) = self.base_layer() else {
            return false;
        };
        let name = layer.name();
        self.doc
            .entitydb
            .get(vp)
            .and_then(Entity::as_viewport)
            .is_some_and(|viewport| viewport.is_layer_frozen(&name))
    }

    fn current(&self, vp: &str) -> LayerOverrides {
        match self.overrides.get(vp) {
            Some(entry) => entry.clone(),
            None => self.default_settings(self.is_layer_frozen_in_vp(vp)),
        }
    }

    fn acquire(&mut self, vp: &str) -> &mut LayerOverrides {
        let defaults = self.current(vp);
        self.overrides.entry(vp.to_string()).or_insert(defaults)
    }

    pub fn set_color(&mut self, vp: &str, aci: i32) -> Result<()> {
        if !is_valid_layer_color_index(aci) {
            return Err(DxfError::InvalidValue(format!("invalid ACI value: {}", aci)));
        }
        self.acquire(vp).aci = aci;
        Ok(())
    }

    pub fn get_color(&self, vp: &str) -> i32 {
        self.current(vp).aci
    }

    /// `None` removes the true color override.
    pub fn set_rgb(&mut self, vp: &str, rgb: Option<(i32, i32, i32)>) -> Result<()> {
        let rgb = rgb.map(Rgb::try_from).transpose()?;
        self.acquire(vp).rgb = rgb;
        Ok(())
    }

    pub fn get_rgb(&self, vp: &str) -> Option<Rgb> {
        self.current(vp).rgb
    }

    /// 0.0 is opaque, 1.0 fully transparent.
    pub fn set_transparency(&mut self, vp: &str, value: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(DxfError::InvalidValue(format!(
                "invalid transparency: {}, has to be in the range [0, 1]",
                value
            )));
        }
        self.acquire(vp).transparency = value;
        Ok(())
    }

    pub fn get_transparency(&self, vp: &str) -> f64 {
        self.current(vp).transparency
    }

    /// The linetype must exist in the document's linetype table.
    pub fn set_linetype(&mut self, vp: &str, linetype: &str) -> Result<()> {
        if !self.doc.linetypes.has_entry(linetype) {
            return Err(DxfError::InvalidValue(format!(
                "invalid linetype: {}, a linetype table entry is required",
                linetype
            )));
        }
        self.acquire(vp).linetype = linetype.to_string();
        Ok(())
    }

    pub fn get_linetype(&self, vp: &str) -> String {
        self.current(vp).linetype
    }

    pub fn set_lineweight(&mut self, vp: &str, lineweight: i32) -> Result<()> {
        if !is_valid_layer_lineweight(lineweight) {
            return Err(DxfError::InvalidValue(format!(
                "invalid lineweight: {}",
                lineweight
            )));
        }
        self.acquire(vp).lineweight = lineweight;
        Ok(())
    }

    pub fn get_lineweight(&self, vp: &str) -> i32 {
        self.current(vp).lineweight
    }

    pub fn is_frozen(&self, vp: &str) -> bool {
        self.current(vp).frozen
    }

    pub fn freeze(&mut self, vp: &str) {
        self.acquire(vp).frozen = true;
    }

    pub fn thaw(&mut self, vp: &str) {
        self.acquire(vp).frozen = false;
    }

    /// Drops the entry of `vp`, or all entries when `vp` is `None`.
    pub fn discard(&mut self, vp: Option<&str>) {
        match vp {
            Some(vp) => {
                self.overrides.remove(vp);
            }
            None => self.overrides.clear(),
        }
    }

    /// Replaces the layer's committed overrides with this session's state.
    pub fn commit(&mut self) -> Result<()> {
        let snapshot = self.overrides.clone();
        let layer = self
            .doc
            .entitydb
            .get_mut(&self.layer)
            .and_then(Entity::as_layer_mut)
            .ok_or_else(|| DxfError::EntityNotFound(self.layer.clone()))?;
        debug!(
            "committing {} viewport overrides of layer '{}'",
            snapshot.len(),
            layer.name()
        );
        layer.replace_committed_overrides(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::DocumentFixture;

    fn fixture() -> DocumentFixture {
        DocumentFixture::new()
            .with_layer("Walls")
            .with_viewport(&["Walls"])
            .with_viewport(&[])
    }

    fn viewports(fixture: &DocumentFixture) -> (Handle, Handle) {
        let handles = fixture.handles_of("VIEWPORT");
        (handles[0].clone(), handles[1].clone())
    }

    #[test]
    fn test_defaults_follow_layer() {
        let mut fixture = fixture();
        let (frozen_vp, thawed_vp) = viewports(&fixture);
        fixture.doc.layer_mut("Walls").unwrap().set_color(3).unwrap();

        let overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        assert_eq!(overrides.get_color(&thawed_vp), 3);
        assert_eq!(overrides.get_linetype(&thawed_vp), "Continuous");
        assert!(overrides.is_frozen(&frozen_vp));
        assert!(!overrides.is_frozen(&thawed_vp));
        assert!(!overrides.has_overrides(None));
    }

    #[test]
    fn test_frozen_default_is_read_live() {
        let mut fixture = fixture();
        let (_, thawed_vp) = viewports(&fixture);
        fixture.doc.viewport_mut(&thawed_vp).unwrap().freeze_layer("WALLS");
        let overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        assert!(overrides.is_frozen(&thawed_vp));
    }

    #[test]
    fn test_setter_materializes_entry() {
        let mut fixture = fixture();
        let (frozen_vp, thawed_vp) = viewports(&fixture);
        let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        overrides.set_color(&thawed_vp, 1).unwrap();
        assert!(overrides.has_overrides(Some(&thawed_vp)));
        assert!(!overrides.has_overrides(Some(&frozen_vp)));
        assert_eq!(overrides.get_color(&thawed_vp), 1);
        assert_eq!(overrides.get_lineweight(&thawed_vp), LINEWEIGHT_DEFAULT);
    }

    #[test]
    fn test_materialized_entry_is_reused() {
        let mut fixture = fixture();
        let (frozen_vp, _) = viewports(&fixture);
        let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        overrides.set_color(&frozen_vp, 1).unwrap();
        overrides.thaw(&frozen_vp);
        overrides.set_lineweight(&frozen_vp, 50).unwrap();
        assert_eq!(overrides.handles().count(), 1);
        assert_eq!(overrides.get_color(&frozen_vp), 1);
        assert!(!overrides.is_frozen(&frozen_vp));
    }

    #[test]
    fn test_invalid_values_leave_store_unchanged() {
        let mut fixture = fixture();
        let (vp, _) = viewports(&fixture);
        let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        assert!(overrides.set_color(&vp, 0).is_err());
        assert!(overrides.set_color(&vp, 256).is_err());
        assert!(overrides.set_rgb(&vp, Some((0, 300, 0))).is_err());
        assert!(overrides.set_transparency(&vp, -0.5).is_err());
        assert!(overrides.set_linetype(&vp, "DASHDOT").is_err());
        assert!(overrides.set_lineweight(&vp, -1).is_err());
        assert!(!overrides.has_overrides(None));
    }

    #[test]
    fn test_setters() {
        let mut fixture = fixture();
        let (vp, _) = viewports(&fixture);
        let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        overrides.set_rgb(&vp, Some((1, 2, 3))).unwrap();
        overrides.set_transparency(&vp, 0.25).unwrap();
        overrides.set_linetype(&vp, "ByLayer").unwrap();
        overrides.set_lineweight(&vp, 50).unwrap();
        overrides.thaw(&vp);
        assert_eq!(overrides.get_rgb(&vp), Some(Rgb::new(1, 2, 3)));
        assert_eq!(overrides.get_transparency(&vp), 0.25);
        assert_eq!(overrides.get_linetype(&vp), "ByLayer");
        assert_eq!(overrides.get_lineweight(&vp), 50);
        assert!(!overrides.is_frozen(&vp));
        overrides.set_rgb(&vp, None).unwrap();
        assert_eq!(overrides.get_rgb(&vp), None);
    }

    #[test]
    fn test_changes_are_lost_without_commit() {
        let mut fixture = fixture();
        let (vp, _) = viewports(&fixture);
        {
            let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
            overrides.set_color(&vp, 5).unwrap();
        }
        let overrides = fixture.doc.viewport_overrides("Walls").unwrap();
        assert!(!overrides.has_overrides(None));
        assert_eq!(overrides.get_color(&vp), 7);
    }

    #[test]
    fn test_commit_replaces_snapshot() {
        let mut fixture = fixture();
        let (vp1, vp2) = viewports(&fixture);
        {
            let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
            overrides.set_color(&vp1, 5).unwrap();
            overrides.commit().unwrap();
        }
        {
            let mut overrides = fixture.doc.viewport_overrides("Walls").unwrap();
            assert_eq!(overrides.get_color(&vp1), 5);
            overrides.discard(Some(&vp1));
            overrides.freeze(&vp2);
            overrides.commit().unwrap();
        }
        let committed = fixture.doc.layer("Walls").unwrap().committed_overrides();
        assert_eq!(committed.len(), 1);
        assert!(committed[&vp2].frozen);
    }
}
