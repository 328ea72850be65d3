//! Attribute specifications and schemas.
//!
//! A record type declares its attributes as const tables of [`AttributeDef`]
//! grouped into [`Subclass`]es. A [`Schema`] wraps those tables together with
//! the group-code lookups needed by the decoder; schemas are built once per
//! record type (behind a `Lazy` static) and shared by every instance.

use super::value::AttrValue;
use crate::version::DxfVersion;
use std::collections::HashMap;

/// The kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Str,
    Int,
    /// Integer restricted to 0/1
    BoolInt,
    Handle,
}

/// Const-friendly default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i32),
}

impl DefaultValue {
    pub fn to_value(self, kind: AttributeKind) -> AttrValue {
        match (self, kind) {
            (DefaultValue::Str(s), AttributeKind::Handle) => AttrValue::Handle(s.to_string()),
            (DefaultValue::Str(s), _) => AttrValue::Str(s.to_string()),
            (DefaultValue::Int(v), _) => AttrValue::Int(v),
        }
    }
}

/// Pure predicate over the raw decoded value.
#[derive(Debug, Clone, Copy)]
pub enum Validator {
    Int(fn(i32) -> bool),
    Str(fn(&str) -> bool),
}

impl Validator {
    /// Values of the wrong type never validate.
    pub fn check(&self, value: &AttrValue) -> bool {
        match (self, value) {
            (Validator::Int(f), AttrValue::Int(v)) => f(*v),
            (Validator::Str(f), AttrValue::Str(s)) => f(s),
            (Validator::Str(f), AttrValue::Handle(h)) => f(h),
            _ => false,
        }
    }
}

/// Pure repair function; its output always satisfies the paired validator.
#[derive(Debug, Clone, Copy)]
pub enum Fixer {
    Int(fn(i32) -> i32),
    Str(fn(&str) -> String),
    /// Replace the invalid value by the schema default.
    ReturnDefault,
}

/// Tables whose entries are referenced by name from other records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRef {
    Layer,
    Linetype,
}

/// Specification for a single attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    pub name: &'static str,
    pub code: i32,
    pub kind: AttributeKind,
    pub default: Option<DefaultValue>,
    /// Oldest document version that knows this attribute
    pub min_version: DxfVersion,
    /// Optional attributes are only written when explicitly set
    pub optional: bool,
    pub validator: Option<Validator>,
    pub fixer: Option<Fixer>,
    /// Set when the value is the name of an entry in another table
    pub refers_to: Option<TableRef>,
}

impl AttributeDef {
    pub const fn new(name: &'static str, code: i32, kind: AttributeKind) -> Self {
        Self {
            name,
            code,
            kind,
            default: None,
            min_version: DxfVersion::R12,
            optional: false,
            validator: None,
            fixer: None,
            refers_to: None,
        }
    }

    pub const fn default_str(mut self, value: &'static str) -> Self {
        self.default = Some(DefaultValue::Str(value));
        self
    }

    pub const fn default_int(mut self, value: i32) -> Self {
        self.default = Some(DefaultValue::Int(value));
        self
    }

    pub const fn since(mut self, version: DxfVersion) -> Self {
        self.min_version = version;
        self
    }

    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub const fn fixer(mut self, fixer: Fixer) -> Self {
        self.fixer = Some(fixer);
        self
    }

    pub const fn refers_to(mut self, table: TableRef) -> Self {
        self.refers_to = Some(table);
        self
    }

    pub fn default_value(&self) -> Option<AttrValue> {
        self.default.map(|d| d.to_value(self.kind))
    }

    pub fn is_valid(&self, value: &AttrValue) -> bool {
        self.validator.map_or(true, |v| v.check(value))
    }

    /// Repairs `value`, returning `None` when no fixer can produce a value.
    pub fn fix(&self, value: &AttrValue) -> Option<AttrValue> {
        match (self.fixer?, value) {
            (Fixer::Int(f), AttrValue::Int(v)) => Some(AttrValue::Int(f(*v))),
            (Fixer::Str(f), AttrValue::Str(s)) => Some(AttrValue::Str(f(s))),
            (Fixer::ReturnDefault, _) => self.default_value(),
            _ => None,
        }
    }

    pub fn exists_in(&self, version: DxfVersion) -> bool {
        version >= self.min_version
    }
}

/// A group of attributes introduced by one subclass marker.
///
/// The base class of every record has no marker.
#[derive(Debug, Clone, Copy)]
pub struct Subclass {
    pub marker: Option<&'static str>,
    pub attributes: &'static [AttributeDef],
}

/// Immutable, shared description of one record type.
#[derive(Debug)]
pub struct Schema {
    pub dxftype: &'static str,
    subclasses: &'static [Subclass],
    code_maps: Vec<HashMap<i32, usize>>,
    names: HashMap<&'static str, (usize, usize)>,
}

impl Schema {
    /// Builds the lookup tables.
    ///
    /// Group codes must be unique within a subclass, names unique within the
    /// schema; both are checked in debug builds.
    pub fn new(dxftype: &'static str, subclasses: &'static [Subclass]) -> Self {
        let mut code_maps = Vec::with_capacity(subclasses.len());
        let mut names = HashMap::new();
        for (sub_idx, subclass) in subclasses.iter().enumerate() {
            let mut codes = HashMap::with_capacity(subclass.attributes.len());
            for (attr_idx, def) in subclass.attributes.iter().enumerate() {
                let previous = codes.insert(def.code, attr_idx);
                debug_assert!(previous.is_none(), "duplicate group code {}", def.code);
                let previous = names.insert(def.name, (sub_idx, attr_idx));
                debug_assert!(previous.is_none(), "duplicate attribute {}", def.name);
            }
            code_maps.push(codes);
        }
        Self {
            dxftype,
            subclasses,
            code_maps,
            names,
        }
    }

    pub fn subclasses(&self) -> &'static [Subclass] {
        self.subclasses
    }

    pub fn get(&self, name: &str) -> Option<&'static AttributeDef> {
        let (sub_idx, attr_idx) = *self.names.get(name)?;
        Some(&self.subclasses[sub_idx].attributes[attr_idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Looks up the attribute declared for `code` in subclass `index`.
    pub fn lookup(&self, index: usize, code: i32) -> Option<&'static AttributeDef> {
        let attr_idx = *self.code_maps.get(index)?.get(&code)?;
        Some(&self.subclasses[index].attributes[attr_idx])
    }

    /// Index of the subclass introduced by `marker`.
    pub fn subclass_index(&self, marker: &str) -> Option<usize> {
        self.subclasses.iter().position(|s| s.marker == Some(marker))
    }

    /// First subclass declaring `code`; used for legacy input without markers.
    pub fn find_code(&self, code: i32) -> Option<(usize, &'static AttributeDef)> {
        (0..self.subclasses.len()).find_map(|idx| self.lookup(idx, code).map(|def| (idx, def)))
    }

    pub fn attributes(&self) -> impl Iterator<Item = &'static AttributeDef> {
        self.subclasses.iter().flat_map(|s| s.attributes.iter())
    }

    /// Attributes holding names of entries in `table`.
    pub fn references_to(&self, table: TableRef) -> impl Iterator<Item = &'static AttributeDef> {
        self.attributes().filter(move |def| def.refers_to == Some(table))
    }
}
