//! # Entity Database
//!
//! Every record of a document is stored once, keyed by its handle. The
//! [`EntityStore`] trait is the seam between the document and the concrete
//! storage; the rest of the crate never touches a map directly.
//!
//! ## Access Patterns
//!
//! - **Lookup**: by handle, the only stable identity of a record. Names are
//!   mutable and live in the name tables instead.
//! - **Full scan**: [`EntityStore::handles`] returns a snapshot of all handles.
//!   Callers that mutate during a scan collect first and apply afterwards, the
//!   store itself offers no iterator that survives mutation.
//!
//! There is no reverse index from names to referencing records. A rename has
//! to visit every record, see [`crate::consistency`].
//!
//! ## Implementations
//!
//! - [`memory::InMemoryEntityDb`]: `BTreeMap` backed, handles in creation order.

use crate::entities::Entity;

pub mod memory;

pub use memory::InMemoryEntityDb;

/// Stable record identifier, an upper-case hex string.
pub type Handle = String;

/// Abstract interface for the entity database.
///
/// Single writer, no internal locking.
pub trait EntityStore {
    fn get(&self, handle: &str) -> Option<&Entity>;

    fn get_mut(&mut self, handle: &str) -> Option<&mut Entity>;

    /// Insert or replace the record stored under `handle`
    fn insert(&mut self, handle: Handle, entity: Entity) -> Option<Entity>;

    fn remove(&mut self, handle: &str) -> Option<Entity>;

    /// Snapshot of all handles
    fn handles(&self) -> Vec<Handle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, handle: &str) -> bool {
        self.get(handle).is_some()
    }

    /// Allocate a handle that is not in use
    fn next_handle(&mut self) -> Handle;

    /// Make sure `next_handle` never returns `handle` or anything below it
    fn reserve_handle(&mut self, handle: &str);
}
