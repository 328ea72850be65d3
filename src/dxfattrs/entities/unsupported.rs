//! Records without a registered type.
//!
//! They keep their complete tag group and are written back verbatim. Layer
//! references inside them cannot be renamed; [`Unsupported::references_layer`]
//! lets the rename report them.

use crate::store::Handle;
use crate::tables::same_name;
use crate::tags::{Tag, TagWriter, HANDLE_CODE};

/// Types known to index layers by name.
pub const LAYER_INDEXING_TYPES: [&str; 2] = ["LAYER_FILTER", "LAYER_INDEX"];

const LAYER_NAME_CODE: i32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Unsupported {
    dxftype: String,
    tags: Vec<Tag>,
}

impl Unsupported {
    /// `tags` is the complete group, including the structure tag.
    pub fn new(dxftype: &str, tags: Vec<Tag>) -> Self {
        Self {
            dxftype: dxftype.to_string(),
            tags,
        }
    }

    pub fn dxftype(&self) -> &str {
        &self.dxftype
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn handle(&self) -> Option<Handle> {
        self.tags
            .iter()
            .find(|tag| tag.code == HANDLE_CODE)
            .and_then(|tag| tag.value.as_str())
            .map(str::to_ascii_uppercase)
    }

    /// Value of the first `(2, name)` tag, table records carry their name there.
    pub fn name(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.code == 2)
            .and_then(|tag| tag.value.as_str())
    }

    /// Returns `true` if this record may hold a reference to layer `name`.
    pub fn references_layer(&self, name: &str) -> bool {
        LAYER_INDEXING_TYPES.contains(&self.dxftype.as_str())
            || self.tags.iter().any(|tag| {
                tag.code == LAYER_NAME_CODE
                    && tag
                        .value
                        .as_str()
                        .is_some_and(|value| same_name(value, name))
            })
    }

    pub fn export<W: TagWriter + ?Sized>(&self, writer: &mut W) {
        for tag in &self.tags {
            writer.write_tag(tag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_indexing_types_always_reference_layers() {
        let filter = Unsupported::new("LAYER_FILTER", vec![Tag::new(0, "LAYER_FILTER")]);
        assert!(filter.references_layer("anything"));
    }

    #[test]
    fn test_layer_name_tags_are_detected() {
        let tags = vec![Tag::new(0, "HATCH"), Tag::new(5, "3c"), Tag::new(8, "Walls")];
        let hatch = Unsupported::new("HATCH", tags);
        assert!(hatch.references_layer("WALLS"));
        assert!(!hatch.references_layer("Doors"));
        assert_eq!(hatch.handle().as_deref(), Some("3C"));
    }

    #[test]
    fn test_layer_names_compare_beyond_ascii() {
        let tags = vec![Tag::new(0, "HATCH"), Tag::new(8, "Ebene-Ä")];
        let hatch = Unsupported::new("HATCH", tags);
        assert!(hatch.references_layer("ebene-ä"));
    }
}
