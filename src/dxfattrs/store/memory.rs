use super::{EntityStore, Handle};
use crate::entities::Entity;
use std::collections::BTreeMap;

/// Handles are hex strings; ordering them by value keeps creation order.
/// Lookup is case-insensitive, handles are stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct HandleKey(u64, Handle);

impl HandleKey {
    fn new(handle: &str) -> Self {
        let handle = handle.to_ascii_uppercase();
        HandleKey(parse_handle(&handle).unwrap_or(u64::MAX), handle)
    }
}

fn parse_handle(handle: &str) -> Option<u64> {
    u64::from_str_radix(handle, 16).ok()
}

#[derive(Debug, Clone)]
pub struct InMemoryEntityDb {
    entities: BTreeMap<HandleKey, Entity>,
    next: u64,
}

impl Default for InMemoryEntityDb {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEntityDb {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            // handle 0 is reserved for "no owner"
            next: 1,
        }
    }
}

impl EntityStore for InMemoryEntityDb {
    fn get(&self, handle: &str) -> Option<&Entity> {
        self.entities.get(&HandleKey::new(handle))
    }

    fn get_mut(&mut self, handle: &str) -> Option<&mut Entity> {
        self.entities.get_mut(&HandleKey::new(handle))
    }

    fn insert(&mut self, handle: Handle, entity: Entity) -> Option<Entity> {
        self.reserve_handle(&handle);
        self.entities.insert(HandleKey::new(&handle), entity)
    }

    fn remove(&mut self, handle: &str) -> Option<Entity> {
        self.entities.remove(&HandleKey::new(handle))
    }

    fn handles(&self) -> Vec<Handle> {
        self.entities.keys().map(|key| key.1.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entities.len()
    }

    fn next_handle(&mut self) -> Handle {
        while self.entities.contains_key(&HandleKey(self.next, format!("{:X}", self.next))) {
            self.next += 1;
        }
        let handle = format!("{:X}", self.next);
        self.next += 1;
        handle
    }

    fn reserve_handle(&mut self, handle: &str) {
        if let Some(value) = parse_handle(handle) {
            if value >= self.next {
                self.next = value.saturating_add(1);
            }
        }
    }
}
