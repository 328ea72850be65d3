//! # Tag Codec
//!
//! Moves attribute values between a [`Namespace`] and an ordered tag stream.
//!
//! ## Decoding
//!
//! A raw entity group is split into structure tag, body and extended data by
//! [`split_group`]. [`load_namespace`] then walks the body:
//!
//! 1. Subclass markers (code 100) select the subclass whose codes are matched
//!    next. Legacy input without markers is matched against all subclasses.
//! 2. A tag whose code is declared is coerced to the attribute kind, checked
//!    by its validator and repaired by its fixer when invalid. Decoding never
//!    aborts on bad values.
//! 3. Attributes newer than the document version are dropped, mirroring the
//!    export rule, so a fixed-version round trip is value preserving.
//! 4. Application data groups `(102, "{APP") .. (102, "}")` in front of the
//!    first subclass marker are kept as a whole, whatever the options say.
//! 5. Anything else is kept opaquely in the namespace for re-export, unless
//!    [`CodecOptions::preserve_unknown_tags`] is off.
//!
//! ## Encoding
//!
//! [`export_dxf_attribs`] writes one tag per requested name, skipping
//! attributes newer than the writer's version and optional attributes that
//! were never set. [`export_subclass`] puts application data back between
//! the handle and the owner, as it is found in files.

use crate::attributes::{AttrValue, AttributeDef, Namespace, Schema};
use crate::config::DxfConfig;
use crate::error::{DxfError, Result};
use crate::tags::{Tag, TagWriter, HANDLE_CODE, XDATA_MARKER};
use crate::version::DxfVersion;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Keep tags with undeclared codes for lossless round trips
    pub preserve_unknown_tags: bool,
    /// Write optional attributes explicitly set to their default value
    pub export_explicit_optional_defaults: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            preserve_unknown_tags: true,
            export_explicit_optional_defaults: true,
        }
    }
}

impl From<&DxfConfig> for CodecOptions {
    fn from(config: &DxfConfig) -> Self {
        Self {
            preserve_unknown_tags: config.preserve_unknown_tags,
            export_explicit_optional_defaults: config.export_explicit_optional_defaults,
        }
    }
}

/// One raw entity, split into its parts.
#[derive(Debug, Clone, Copy)]
pub struct TagGroup<'a> {
    pub dxftype: &'a str,
    pub body: &'a [Tag],
    pub xdata: &'a [Tag],
}

/// Splits a raw entity group at its structure tag and first xdata marker.
pub fn split_group(tags: &[Tag]) -> Result<TagGroup<'_>> {
    let (first, rest) = tags
        .split_first()
        .ok_or_else(|| DxfError::Structure("empty tag group".to_string()))?;
    if !first.is_structure() {
        return Err(DxfError::Structure(format!(
            "expected structure tag (0, <type>), got {}",
            first
        )));
    }
    let dxftype = first
        .value
        .as_str()
        .ok_or_else(|| DxfError::Structure(format!("invalid structure tag {}", first)))?;
    let split = rest
        .iter()
        .position(|t| t.code == XDATA_MARKER)
        .unwrap_or(rest.len());
    Ok(TagGroup {
        dxftype,
        body: &rest[..split],
        xdata: &rest[split..],
    })
}

/// Decodes the body of an entity group into a new namespace.
pub fn load_namespace(
    schema: &'static Schema,
    body: &[Tag],
    version: DxfVersion,
    options: CodecOptions,
) -> Namespace {
    let mut ns = Namespace::new(schema);
    let body = extract_app_data(&mut ns, body);
    if !body.iter().any(Tag::is_subclass_marker) {
        for tag in &body {
            match schema.find_code(tag.code) {
                Some((index, def)) => load_attribute(&mut ns, index, def, tag, version, options),
                None => keep_unknown(&mut ns, 0, tag, options),
            }
        }
        return ns;
    }

    let mut current = Some(0);
    let mut foreign: Option<Vec<Tag>> = None;
    for tag in &body {
        if tag.is_subclass_marker() {
            flush_foreign(&mut ns, foreign.take(), options);
            let marker = tag.value.as_str().unwrap_or_default();
            current = schema.subclass_index(marker);
            if current.is_none() {
                debug!("{}: preserving undeclared subclass {}", schema.dxftype, marker);
                foreign = Some(vec![tag.clone()]);
            }
            continue;
        }
        match current {
            Some(index) => match schema.lookup(index, tag.code) {
                Some(def) => load_attribute(&mut ns, index, def, tag, version, options),
                None => keep_unknown(&mut ns, index, tag, options),
            },
            None => {
                if let Some(group) = foreign.as_mut() {
                    group.push(tag.clone());
                }
            }
        }
    }
    flush_foreign(&mut ns, foreign, options);
    ns
}

/// Moves application data groups in front of the first subclass marker into
/// `ns` and returns the remaining tags.
fn extract_app_data(ns: &mut Namespace, body: &[Tag]) -> Vec<Tag> {
    let mut rest = Vec::with_capacity(body.len());
    let mut group: Option<Vec<Tag>> = None;
    let mut in_base = true;
    for tag in body {
        if tag.is_subclass_marker() {
            in_base = false;
            if let Some(tags) = group.take() {
                warn!("{}: unterminated app data group {}", ns.schema().dxftype, tags[0]);
                ns.push_app_data(tags);
            }
        }
        if let Some(tags) = group.as_mut() {
            tags.push(tag.clone());
            if tag.is_app_data_end() {
                ns.push_app_data(std::mem::take(tags));
                group = None;
            }
            continue;
        }
        if in_base && tag.is_app_data_start() {
            group = Some(vec![tag.clone()]);
            continue;
        }
        rest.push(tag.clone());
    }
    if let Some(tags) = group {
        warn!("{}: unterminated app data group {}", ns.schema().dxftype, tags[0]);
        ns.push_app_data(tags);
    }
    rest
}

fn load_attribute(
    ns: &mut Namespace,
    subclass: usize,
    def: &'static AttributeDef,
    tag: &Tag,
    version: DxfVersion,
    options: CodecOptions,
) {
    if !def.exists_in(version) {
        debug!(
            "{}: dropping {} ({}) requires {}, document is {}",
            ns.schema().dxftype,
            def.name,
            def.code,
            def.min_version,
            version
        );
        return;
    }
    if ns.has(def.name) {
        // first occurrence wins, duplicates survive as unknown tags
        keep_unknown(ns, subclass, tag, options);
        return;
    }
    let Some(value) = AttrValue::coerce(def.kind, &tag.value) else {
        warn!(
            "{}: cannot read {} from {}, keeping tag as unknown",
            ns.schema().dxftype,
            def.name,
            tag
        );
        keep_unknown(ns, subclass, tag, options);
        return;
    };
    let value = if def.is_valid(&value) {
        value
    } else {
        match def.fix(&value) {
            Some(fixed) => {
                warn!(
                    "{}: repaired invalid {} {:?} -> {:?}",
                    ns.schema().dxftype,
                    def.name,
                    value,
                    fixed
                );
                fixed
            }
            None => {
                warn!(
                    "{}: invalid {} {:?} has no fixer, keeping it",
                    ns.schema().dxftype,
                    def.name,
                    value
                );
                value
            }
        }
    };
    ns.unprotected_set(def, value);
}

fn keep_unknown(ns: &mut Namespace, subclass: usize, tag: &Tag, options: CodecOptions) {
    if options.preserve_unknown_tags {
        ns.push_unprocessed(subclass, tag.clone());
    } else {
        debug!("{}: discarding unknown tag {}", ns.schema().dxftype, tag);
    }
}

fn flush_foreign(ns: &mut Namespace, group: Option<Vec<Tag>>, options: CodecOptions) {
    if let Some(group) = group {
        if options.preserve_unknown_tags {
            ns.push_foreign_subclass(group);
        }
    }
}

/// Writes the named attributes in the given order.
pub fn export_dxf_attribs<W: TagWriter + ?Sized>(
    ns: &Namespace,
    writer: &mut W,
    names: &[&str],
    options: CodecOptions,
) -> Result<()> {
    let version = writer.dxfversion();
    for name in names {
        let def = ns
            .schema()
            .get(name)
            .ok_or_else(|| DxfError::UnknownAttribute(name.to_string()))?;
        if !def.exists_in(version) {
            continue;
        }
        if def.optional && !ns.has(name) {
            continue;
        }
        let Some(value) = ns.get(name) else {
            continue;
        };
        if def.optional
            && !options.export_explicit_optional_defaults
            && def.default_value().as_ref() == Some(&value)
        {
            continue;
        }
        writer.write_tag2(def.code, value.to_tag_value());
    }
    Ok(())
}

/// Re-emits tags preserved for subclass `index`.
pub fn export_unprocessed<W: TagWriter + ?Sized>(ns: &Namespace, writer: &mut W, index: usize) {
    for tag in ns.unprocessed(index) {
        writer.write_tag(tag.clone());
    }
}

/// Writes one declared subclass: marker, attributes in declaration order,
/// then its preserved unknown tags.
pub fn export_subclass<W: TagWriter + ?Sized>(
    ns: &Namespace,
    writer: &mut W,
    index: usize,
    options: CodecOptions,
) -> Result<()> {
    let Some(subclass) = ns.schema().subclasses().get(index) else {
        return Ok(());
    };
    if let Some(marker) = subclass.marker {
        if writer.dxfversion().has_subclass_markers() {
            writer.write_subclass_marker(marker);
        }
    }
    let names: Vec<&str> = subclass.attributes.iter().map(|def| def.name).collect();
    if index > 0 {
        export_dxf_attribs(ns, writer, &names, options)?;
        export_unprocessed(ns, writer, index);
        return Ok(());
    }
    let split = subclass
        .attributes
        .iter()
        .position(|def| def.code == HANDLE_CODE)
        .map_or(0, |at| at + 1);
    export_dxf_attribs(ns, writer, &names[..split], options)?;
    export_app_data(ns, writer);
    export_dxf_attribs(ns, writer, &names[split..], options)?;
    export_unprocessed(ns, writer, index);
    Ok(())
}

/// Application data does not exist in legacy output.
pub fn export_app_data<W: TagWriter + ?Sized>(ns: &Namespace, writer: &mut W) {
    if !writer.dxfversion().has_subclass_markers() {
        return;
    }
    for group in ns.app_data() {
        for tag in group {
            writer.write_tag(tag.clone());
        }
    }
}

/// Re-emits subclasses the schema does not declare; legacy output has no
/// subclasses at all.
pub fn export_foreign_subclasses<W: TagWriter + ?Sized>(ns: &Namespace, writer: &mut W) {
    if !writer.dxfversion().has_subclass_markers() {
        return;
    }
    for group in ns.foreign_subclasses() {
        for tag in group {
            writer.write_tag(tag.clone());
        }
    }
}
