//! The access capability shared by every structured value.
//!
//! Reactive wrappers never poke at a target's storage directly. They go
//! through [`Shape`], which the record and list types implement, and they
//! hold a [`Target`] so dispatch stays static over the closed set of
//! supported shapes.

use super::{List, Record, Value};
use crate::error::Result;
use crate::graph::{Field, TargetId};

/// What a write did to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The stored value was already the same; nothing changed.
    Unchanged,

    /// An existing field now holds a different value.
    Updated,

    /// The field did not exist before; the key set grew.
    Added,
}

impl WriteOutcome {
    pub fn changed(self) -> bool {
        self != WriteOutcome::Unchanged
    }
}

/// Read/write access to the fields of a structured value.
///
/// These calls are untracked; tracking is layered on top by the reactive
/// wrapper.
pub trait Shape {
    /// Identity of the underlying storage.
    fn id(&self) -> TargetId;

    /// Current value of `field`, or `None` if the target has no such field.
    fn read(&self, field: &Field) -> Option<Value>;

    /// Store `value` in `field` unless it already holds the same value.
    fn write(&self, field: &Field, value: Value) -> Result<WriteOutcome>;

    /// Number of fields (record) or elements (list).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A structured value the reactive layer can wrap.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Record(Record),
    List(List),
}

impl Shape for Target {
    fn id(&self) -> TargetId {
        match self {
            Target::Record(record) => record.id(),
            Target::List(list) => list.id(),
        }
    }

    fn read(&self, field: &Field) -> Option<Value> {
        match self {
            Target::Record(record) => record.read(field),
            Target::List(list) => list.read(field),
        }
    }

    fn write(&self, field: &Field, value: Value) -> Result<WriteOutcome> {
        match self {
            Target::Record(record) => record.write(field, value),
            Target::List(list) => list.write(field, value),
        }
    }

    fn len(&self) -> usize {
        match self {
            Target::Record(record) => Shape::len(record),
            Target::List(list) => Shape::len(list),
        }
    }
}

impl From<Record> for Target {
    fn from(record: Record) -> Self {
        Target::Record(record)
    }
}

impl From<List> for Target {
    fn from(list: List) -> Self {
        Target::List(list)
    }
}

impl From<Target> for Value {
    fn from(target: Target) -> Self {
        match target {
            Target::Record(record) => Value::Record(record),
            Target::List(list) => Value::List(list),
        }
    }
}
