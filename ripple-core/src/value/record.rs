//! Record targets: ordered maps of named fields.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::shape::{Shape, WriteOutcome};
use super::Value;
use crate::error::{ReactiveError, Result};
use crate::graph::{Field, TargetId};

/// A shared, mutable record.
///
/// Cloning a `Record` clones the handle; both clones see the same fields.
/// Access through these methods is untracked. Wrap the record with
/// [`wrap`](crate::reactive::wrap) to make reads and writes reactive.
#[derive(Clone)]
pub struct Record {
    id: TargetId,
    fields: Rc<RefCell<IndexMap<String, Value>>>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            id: TargetId::new(),
            fields: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Untracked read of a field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    /// Untracked write. Returns the previous value, if any.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.borrow_mut().insert(name.into(), value.into())
    }

    /// Untracked removal, keeping the order of the remaining fields.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.fields.borrow_mut().shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    /// Fields in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.fields
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let record = Record::new();
        {
            let mut fields = record.fields.borrow_mut();
            for (name, value) in iter {
                fields.insert(name.into(), value.into());
            }
        }
        record
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the shape: records may contain themselves.
        f.debug_struct("Record")
            .field("id", &self.id.raw())
            .field("keys", &self.keys())
            .finish()
    }
}

impl Shape for Record {
    fn id(&self) -> TargetId {
        self.id
    }

    fn read(&self, field: &Field) -> Option<Value> {
        match field {
            Field::Name(name) => self.get(name),
            Field::Index(_) | Field::Keys => None,
        }
    }

    fn write(&self, field: &Field, value: Value) -> Result<WriteOutcome> {
        let name = match field {
            Field::Name(name) => name,
            Field::Index(_) => return Err(ReactiveError::NotAList),
            // The key set has no value of its own to store.
            Field::Keys => return Ok(WriteOutcome::Unchanged),
        };

        let mut fields = self.fields.borrow_mut();
        match fields.get_mut(name.as_str()) {
            Some(current) if current.same(&value) => Ok(WriteOutcome::Unchanged),
            Some(current) => {
                *current = value;
                Ok(WriteOutcome::Updated)
            }
            None => {
                fields.insert(name.clone(), value);
                Ok(WriteOutcome::Added)
            }
        }
    }

    fn len(&self) -> usize {
        Record::len(self)
    }
}
