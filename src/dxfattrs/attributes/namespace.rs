//! Per-record attribute storage.
//!
//! A [`Namespace`] only accepts names declared by its schema. Unset attributes
//! read back as the schema default, while [`Namespace::has`] reports whether a
//! value was explicitly stored; the codec needs both to implement the
//! "optional and unset" export rule.
//!
//! Tags the decoder could not map to a declared attribute are kept here as
//! well, grouped by the subclass they were found in, so an export can put
//! them back where they came from. Application data groups (code 102) of the
//! base subclass are kept apart, they are written right after the handle.

use super::spec::{AttributeDef, Schema};
use super::value::AttrValue;
use crate::error::{DxfError, Result};
use crate::tags::Tag;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Namespace {
    schema: &'static Schema,
    values: HashMap<&'static str, AttrValue>,
    app_data: Vec<Vec<Tag>>,
    unprocessed: Vec<Vec<Tag>>,
    foreign_subclasses: Vec<Vec<Tag>>,
}

impl Namespace {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            app_data: Vec::new(),
            unprocessed: vec![Vec::new(); schema.subclasses().len()],
            foreign_subclasses: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    /// Explicitly set value or schema default.
    pub fn get(&self, name: &str) -> Option<AttrValue> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self.schema.get(name)?.default_value(),
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name)?.as_int()
    }

    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_handle(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            AttrValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Returns `true` if `name` was explicitly set.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Sets a declared attribute after checking its kind and validator.
    pub fn set(&mut self, name: &str, value: AttrValue) -> Result<()> {
        let def = self.definition(name)?;
        if !value.fits(def.kind) {
            return Err(DxfError::InvalidValue(format!(
                "{:?} is not a valid {:?} value for '{}'",
                value, def.kind, name
            )));
        }
        if !def.is_valid(&value) {
            return Err(DxfError::InvalidValue(format!(
                "{:?} rejected by validator of '{}'",
                value, name
            )));
        }
        self.values.insert(def.name, value);
        Ok(())
    }

    /// Stores without validation; the decoder has already applied fixers.
    pub(crate) fn unprotected_set(&mut self, def: &'static AttributeDef, value: AttrValue) {
        self.values.insert(def.name, value);
    }

    /// Removes an explicit value, the attribute reads as default afterwards.
    pub fn discard(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    /// Names of explicitly set attributes, in schema order.
    pub fn explicit_names(&self) -> Vec<&'static str> {
        self.schema
            .attributes()
            .map(|def| def.name)
            .filter(|name| self.values.contains_key(name))
            .collect()
    }

    /// `102 {APP .. 102 }` groups of the base subclass, brackets included.
    pub fn app_data(&self) -> &[Vec<Tag>] {
        &self.app_data
    }

    pub(crate) fn push_app_data(&mut self, tags: Vec<Tag>) {
        self.app_data.push(tags);
    }

    pub fn unprocessed(&self, subclass: usize) -> &[Tag] {
        self.unprocessed
            .get(subclass)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn push_unprocessed(&mut self, subclass: usize, tag: Tag) {
        if let Some(tags) = self.unprocessed.get_mut(subclass) {
            tags.push(tag);
        }
    }

    /// Complete tag groups of subclasses this schema does not declare,
    /// each starting with its marker.
    pub fn foreign_subclasses(&self) -> &[Vec<Tag>] {
        &self.foreign_subclasses
    }

    pub(crate) fn push_foreign_subclass(&mut self, tags: Vec<Tag>) {
        self.foreign_subclasses.push(tags);
    }

    fn definition(&self, name: &str) -> Result<&'static AttributeDef> {
        self.schema.get(name).ok_or_else(|| {
            DxfError::UnknownAttribute(format!(
                "'{}' is not an attribute of {}",
                name, self.schema.dxftype
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::spec::{AttributeKind, Subclass, Validator};
    use once_cell::sync::Lazy;

    fn small(v: i32) -> bool {
        (0..10).contains(&v)
    }

    const ATTRS: &[AttributeDef] = &[
        AttributeDef::new("handle", 5, AttributeKind::Handle),
        AttributeDef::new("name", 2, AttributeKind::Str).default_str("0"),
        AttributeDef::new("level", 70, AttributeKind::Int)
            .default_int(3)
            .validator(Validator::Int(small)),
    ];

    const SUBCLASSES: &[Subclass] = &[Subclass {
        marker: None,
        attributes: ATTRS,
    }];

    static SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new("TEST", SUBCLASSES));

    #[test]
    fn unset_attribute_reads_default() {
        let ns = Namespace::new(&SCHEMA);
        assert_eq!(ns.get_str("name").as_deref(), Some("0"));
        assert_eq!(ns.get_int("level"), Some(3));
        assert!(!ns.has("name"));
        assert!(ns.get("handle").is_none());
    }

    #[test]
    fn set_marks_attribute_as_present() {
        let mut ns = Namespace::new(&SCHEMA);
        ns.set("name", "WALLS".into()).unwrap();
        assert!(ns.has("name"));
        assert_eq!(ns.get_str("name").as_deref(), Some("WALLS"));
        assert_eq!(ns.explicit_names(), vec!["name"]);
    }

    #[test]
    fn set_default_value_still_counts_as_set() {
        let mut ns = Namespace::new(&SCHEMA);
        ns.set("level", 3.into()).unwrap();
        assert!(ns.has("level"));
    }

    #[test]
    fn set_rejects_undeclared_names() {
        let mut ns = Namespace::new(&SCHEMA);
        let err = ns.set("color", 1.into()).unwrap_err();
        assert!(matches!(err, DxfError::UnknownAttribute(_)));
    }

    #[test]
    fn set_rejects_wrong_kind_and_invalid_values() {
        let mut ns = Namespace::new(&SCHEMA);
        assert!(matches!(
            ns.set("level", "high".into()),
            Err(DxfError::InvalidValue(_))
        ));
        assert!(matches!(
            ns.set("level", 42.into()),
            Err(DxfError::InvalidValue(_))
        ));
        assert!(!ns.has("level"));
    }

    #[test]
    fn discard_restores_default() {
        let mut ns = Namespace::new(&SCHEMA);
        ns.set("level", 5.into()).unwrap();
        assert_eq!(ns.discard("level"), Some(AttrValue::Int(5)));
        assert_eq!(ns.get_int("level"), Some(3));
        assert!(!ns.has("level"));
    }

    #[test]
    fn unprocessed_tags_are_grouped_by_subclass() {
        let mut ns = Namespace::new(&SCHEMA);
        ns.push_unprocessed(0, Tag::new(999, "x"));
        ns.push_unprocessed(7, Tag::new(999, "ignored"));
        assert_eq!(ns.unprocessed(0).len(), 1);
        assert!(ns.unprocessed(7).is_empty());
    }
}
