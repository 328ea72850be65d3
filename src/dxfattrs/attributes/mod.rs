//! # Attribute System
//!
//! Records are not hand-written structs with one field per DXF group code.
//! Each record type declares its attributes once, as data, and shares a
//! generic storage and codec:
//!
//! - **Specifications** ([`spec`]): tag code, default, minimum version,
//!   optional flag, validator and fixer per attribute
//! - **Values** ([`value`]): runtime representation of decoded attributes
//! - **Validation** ([`validation`]): the validator/fixer library
//! - **Namespace** ([`namespace`]): the per-record property bag
//!
//! ## Attribute Kinds
//!
//! | Kind | Examples | Description |
//! |------|----------|-------------|
//! | `Str` | `name`, `linetype` | Free text or table entry name |
//! | `Int` | `flags`, `color`, `lineweight` | Integer code or enumerated value |
//! | `BoolInt` | `plot` | 0/1 stored as integer |
//! | `Handle` | `plotstyle_handle` | Reference to another record |
//!
//! ## Usage
//!
//! ```ignore
//! let mut ns = Namespace::new(&LAYER_SCHEMA);
//! ns.get_int("color");              // Some(7), the schema default
//! ns.set("color", AttrValue::Int(-5))?;
//! ns.has("color");                  // true
//! ```

pub mod namespace;
pub mod spec;
pub mod validation;
pub mod value;

pub use namespace::Namespace;
pub use spec::{
    AttributeDef, AttributeKind, DefaultValue, Fixer, Schema, Subclass, TableRef, Validator,
};
pub use value::AttrValue;
