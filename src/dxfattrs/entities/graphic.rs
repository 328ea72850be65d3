//! Drawing records: LINE, POINT, CIRCLE, ARC, TEXT.
//!
//! Only the `AcDbEntity` attributes are declared; they are what ties a
//! drawing record to the layer and linetype tables. Geometry is kept as
//! unknown tags of the type subclass.

use super::{export_namespace, BASE_ATTRIBS, ENTITY_ATTRIBS, ENTITY_MARKER};
use crate::attributes::{AttrValue, AttributeDef, AttributeKind, Namespace, Schema, Subclass};
use crate::codec::{self, CodecOptions, TagGroup};
use crate::error::{DxfError, Result};
use crate::tags::{TagValue, TagWriter};
use crate::version::DxfVersion;
use crate::xdata::XData;
use once_cell::sync::Lazy;

const BASE: Subclass = Subclass {
    marker: None,
    attributes: BASE_ATTRIBS,
};

const ENTITY: Subclass = Subclass {
    marker: Some(ENTITY_MARKER),
    attributes: ENTITY_ATTRIBS,
};

const TEXT_ATTRIBS: &[AttributeDef] = &[
    AttributeDef::new("text", 1, AttributeKind::Str).default_str(""),
    AttributeDef::new("style", 7, AttributeKind::Str)
        .default_str("Standard")
        .optional(),
];

const LINE: &[Subclass] = &[
    BASE,
    ENTITY,
    Subclass {
        marker: Some("AcDbLine"),
        attributes: &[],
    },
];

const POINT: &[Subclass] = &[
    BASE,
    ENTITY,
    Subclass {
        marker: Some("AcDbPoint"),
        attributes: &[],
    },
];

const CIRCLE: &[Subclass] = &[
    BASE,
    ENTITY,
    Subclass {
        marker: Some("AcDbCircle"),
        attributes: &[],
    },
];

const ARC: &[Subclass] = &[
    BASE,
    ENTITY,
    Subclass {
        marker: Some("AcDbCircle"),
        attributes: &[],
    },
    Subclass {
        marker: Some("AcDbArc"),
        attributes: &[],
    },
];

const TEXT: &[Subclass] = &[
    BASE,
    ENTITY,
    Subclass {
        marker: Some("AcDbText"),
        attributes: TEXT_ATTRIBS,
    },
];

static LINE_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new("LINE", LINE));
static POINT_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new("POINT", POINT));
static CIRCLE_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new("CIRCLE", CIRCLE));
static ARC_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new("ARC", ARC));
static TEXT_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new("TEXT", TEXT));

pub const DXFTYPES: [&str; 5] = ["LINE", "POINT", "CIRCLE", "ARC", "TEXT"];

fn schema_for(dxftype: &str) -> Option<&'static Schema> {
    let schema: &'static Lazy<Schema> = match dxftype {
        "LINE" => &LINE_SCHEMA,
        "POINT" => &POINT_SCHEMA,
        "CIRCLE" => &CIRCLE_SCHEMA,
        "ARC" => &ARC_SCHEMA,
        "TEXT" => &TEXT_SCHEMA,
        _ => return None,
    };
    Some(Lazy::force(schema))
}

#[derive(Debug, Clone)]
pub struct Graphic {
    pub dxf: Namespace,
    pub xdata: XData,
}

impl Graphic {
    pub fn new(dxftype: &str) -> Result<Self> {
        let schema = schema_for(dxftype)
            .ok_or_else(|| DxfError::InvalidValue(format!("not a graphic type: {}", dxftype)))?;
        Ok(Self {
            dxf: Namespace::new(schema),
            xdata: XData::new(),
        })
    }

    pub fn load(group: TagGroup<'_>, version: DxfVersion, options: CodecOptions) -> Result<Self> {
        let schema = schema_for(group.dxftype).ok_or_else(|| {
            DxfError::Structure(format!("not a graphic type: {}", group.dxftype))
        })?;
        Ok(Self {
            dxf: codec::load_namespace(schema, group.body, version, options),
            xdata: XData::from_tags(group.xdata)?,
        })
    }

    pub fn export<W: TagWriter + ?Sized>(
        &self,
        writer: &mut W,
        options: CodecOptions,
    ) -> Result<()> {
        writer.write_tag2(0, TagValue::Str(self.dxftype().to_string()));
        export_namespace(&self.dxf, writer, options)?;
        self.xdata.export(writer);
        Ok(())
    }

    pub fn dxftype(&self) -> &'static str {
        self.dxf.schema().dxftype
    }

    pub fn layer(&self) -> String {
        self.dxf.get_str("layer").unwrap_or_default()
    }

    pub fn set_layer(&mut self, name: &str) -> Result<()> {
        self.dxf.set("layer", AttrValue::Str(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::split_group;
    use crate::tags::{Tag, TagCollector};

    #[test]
    fn test_new_rejects_other_types() {
        assert!(Graphic::new("LINE").is_ok());
        assert!(Graphic::new("LAYER").is_err());
    }

    #[test]
    fn test_layer_defaults_to_zero() {
        let line = Graphic::new("LINE").unwrap();
        assert_eq!(line.layer(), "0");
        assert!(!line.dxf.has("layer"));
    }

    #[test]
    fn test_set_layer_validates_name() {
        let mut line = Graphic::new("LINE").unwrap();
        line.set_layer("Walls").unwrap();
        assert!(line.set_layer("a:b").is_err());
        assert_eq!(line.layer(), "Walls");
    }

    #[test]
    fn test_arc_round_trip_keeps_geometry() {
        let tags = vec![
            Tag::new(0, "ARC"),
            Tag::new(5, "2B"),
            Tag::new(330, "1F"),
            Tag::new(100, "AcDbEntity"),
            Tag::new(8, "Walls"),
            Tag::new(100, "AcDbCircle"),
            Tag::new(10, 1.0),
            Tag::new(20, 2.0),
            Tag::new(30, 0.0),
            Tag::new(40, 3.5),
            Tag::new(100, "AcDbArc"),
            Tag::new(50, 0.0),
            Tag::new(51, 90.0),
        ];
        let group = split_group(&tags).unwrap();
        let arc = Graphic::load(group, DxfVersion::R2000, CodecOptions::default()).unwrap();
        assert_eq!(arc.layer(), "Walls");
        let mut writer = TagCollector::new(DxfVersion::R2000);
        arc.export(&mut writer, CodecOptions::default()).unwrap();
        assert_eq!(writer.tags, tags);
    }
}
