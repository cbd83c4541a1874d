//! List targets: ordered sequences of values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::shape::{Shape, WriteOutcome};
use super::Value;
use crate::error::{ReactiveError, Result};
use crate::graph::{Field, TargetId};

/// A shared, mutable list.
///
/// Same handle semantics as [`Record`](super::Record): clones alias the same
/// storage and direct access is untracked.
#[derive(Clone)]
pub struct List {
    id: TargetId,
    items: Rc<RefCell<Vec<Value>>>,
}

impl List {
    pub fn new() -> Self {
        Self {
            id: TargetId::new(),
            items: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.borrow().get(index).cloned()
    }

    /// Untracked write to an existing position.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let mut items = self.items.borrow_mut();
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(ReactiveError::IndexOutOfBounds { index, len })?;
        Ok(std::mem::replace(slot, value.into()))
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.items.borrow_mut().push(value.into());
    }

    pub fn pop(&self) -> Option<Value> {
        self.items.borrow_mut().pop()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let list = List::new();
        list.items
            .borrow_mut()
            .extend(iter.into_iter().map(Into::into));
        list
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("id", &self.id.raw())
            .field("len", &self.len())
            .finish()
    }
}

impl Shape for List {
    fn id(&self) -> TargetId {
        self.id
    }

    fn read(&self, field: &Field) -> Option<Value> {
        match field {
            Field::Index(index) => self.get(*index),
            Field::Name(_) | Field::Keys => None,
        }
    }

    fn write(&self, field: &Field, value: Value) -> Result<WriteOutcome> {
        let index = match field {
            Field::Index(index) => *index,
            Field::Name(_) => return Err(ReactiveError::NotARecord),
            Field::Keys => return Ok(WriteOutcome::Unchanged),
        };

        let mut items = self.items.borrow_mut();
        let len = items.len();
        if index == len {
            items.push(value);
            return Ok(WriteOutcome::Added);
        }

        let slot = items
            .get_mut(index)
            .ok_or(ReactiveError::IndexOutOfBounds { index, len })?;
        if slot.same(&value) {
            return Ok(WriteOutcome::Unchanged);
        }
        *slot = value;
        Ok(WriteOutcome::Updated)
    }

    fn len(&self) -> usize {
        List::len(self)
    }
}
