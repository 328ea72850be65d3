//! # dxfattrs Architecture
//!
//! dxfattrs models DXF table records as **schema-driven attribute namespaces**. Every record type
//! declares its attributes once, in a const table, and everything else (loading, validation,
//! export, reference tracking) is driven by that declaration.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Document (document.rs, consistency.rs, overrides.rs)       │
//! │  - Name tables + entity database                            │
//! │  - Cross-record operations: rename, overrides, appids       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Records (entities/)                                        │
//! │  - LAYER, VIEWPORT, graphic entities, raw records           │
//! │  - Registry from type name to loader                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Codec (codec.rs, xdata.rs, tags.rs)                        │
//! │  - Tag groups in, namespaces out, and back                  │
//! │  - Version gating, repair, unknown tag preservation         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Attributes (attributes/)                                   │
//! │  - Schemas, values, validators and fixers                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No I/O in Core
//!
//! The library never reads or writes DXF files. Tags come in as [`tags::Tag`] values and go out
//! through the [`tags::TagWriter`] trait; the caller owns the file format. The only file the
//! library touches is its own `config.json`, see [`config`].
//!
//! ## Logging
//!
//! All diagnostics go through the `log` facade. Repairs and data that cannot be represented
//! are logged at `warn`, dropped version-gated attributes at `debug`, and completed renames at
//! `info`. Install any logger to see them.
//!
//! ## Testing Strategy
//!
//! Unit tests live next to the code. `document::fixtures` builds populated documents and is
//! available to other crates with the `test_utils` feature. End to end scenarios live in
//! `tests/`.
//!
//! ## Module Overview
//!
//! - [`attributes`]: Attribute schemas, values, validation and namespaces
//! - [`codec`]: Tag group decoding and encoding
//! - [`colors`]: Color index, true color and transparency conversions
//! - [`config`]: Configuration management
//! - [`consistency`]: Layer rename with reference rewriting
//! - [`document`]: Name tables and entity database
//! - [`entities`]: Record types and the type registry
//! - [`error`]: Error types
//! - [`overrides`]: Per-viewport layer overrides
//! - [`store`]: Entity database abstraction and in-memory implementation
//! - [`tables`]: Case-insensitive name tables
//! - [`tags`]: Group code / value pairs
//! - [`version`]: DXF versions
//! - [`xdata`]: Extended data

pub mod attributes;
pub mod codec;
pub mod colors;
pub mod config;
pub mod consistency;
pub mod document;
pub mod entities;
pub mod error;
pub mod overrides;
pub mod store;
pub mod tables;
pub mod tags;
pub mod version;
pub mod xdata;

pub use config::DxfConfig;
pub use consistency::RenameReport;
pub use document::Document;
pub use entities::{Entity, Layer, Viewport};
pub use error::{DxfError, Result};
pub use overrides::{LayerOverrides, ViewportOverrides};
pub use tags::{Tag, TagValue};
pub use version::DxfVersion;
