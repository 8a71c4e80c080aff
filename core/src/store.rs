//! Insertion-ordered, id-keyed record collections.
//!
//! A [`Registry`] owns the records of one entity kind. Every mutating call
//! either fully succeeds or leaves the collection untouched.

use crate::error::{OrchestraError, Result};

/// A record that can live in a [`Registry`].
pub trait Record: Clone {
    /// Partial update accepted by [`Registry::update`].
    type Patch;

    /// Human-readable entity name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Merge `patch` into the record. Implementations validate the whole
    /// patch before touching any field.
    fn apply(&mut self, patch: Self::Patch) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Registry<T> {
    records: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<T: Record> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: T) -> Result<&T> {
        if self.contains(record.id()) {
            return Err(OrchestraError::Conflict {
                kind: T::KIND,
                id: record.id().to_string(),
            });
        }
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn update(&mut self, id: &str, patch: T::Patch) -> Result<&T> {
        let index = self.position(id)?;
        let mut next = self.records[index].clone();
        next.apply(patch)?;
        self.records[index] = next;
        Ok(&self.records[index])
    }

    pub fn remove(&mut self, id: &str) -> Result<T> {
        let index = self.position(id)?;
        Ok(self.records.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Snapshot of every record in insertion order.
    pub fn list(&self) -> Vec<T> {
        self.records.clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| OrchestraError::not_found(T::KIND, id))
    }
}
