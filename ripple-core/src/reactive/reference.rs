//! A single reactive cell.
//!
//! `Ref` covers the case where the state is one value rather than a record
//! of fields. It is a one-field record underneath, so it tracks and
//! triggers exactly like any other wrapper.

use std::fmt;

use super::wrapper::{wrap, Reactive, Tracked};
use crate::error::Result;
use crate::graph::DependencyKey;
use crate::value::{Record, Value};

const VALUE: &str = "value";

/// A reactive cell holding one value.
///
/// ```rust,ignore
/// let age = Ref::new(0);
/// let a = age.clone();
/// Effect::new(move || println!("{:?}", a.get()));
/// age.update(|n| Value::Int(n.as_int().unwrap_or(0) + 1))?;
/// ```
#[derive(Clone)]
pub struct Ref {
    record: Record,
    cell: Reactive,
}

impl Ref {
    pub fn new(value: impl Into<Value>) -> Self {
        let record = Record::from_iter([(VALUE, value.into())]);
        Self {
            cell: wrap(record.clone()),
            record,
        }
    }

    /// Read the value, tracking it for the current effect.
    pub fn get(&self) -> Tracked {
        self.cell
            .get(VALUE)
            .unwrap_or(Tracked::Value(Value::Null))
    }

    /// Read the value without tracking.
    pub fn get_untracked(&self) -> Value {
        self.record.get(VALUE).unwrap_or_default()
    }

    /// Replace the value. Returns whether it changed.
    pub fn set(&self, value: impl Into<Value>) -> Result<bool> {
        let outcome = self.cell.set(VALUE, value)?;
        Ok(outcome.changed())
    }

    /// Replace the value with `f(current)`, reading it untracked.
    pub fn update<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.get_untracked());
        self.set(next)
    }

    /// The dependency key effects subscribe to when they read this cell.
    pub fn key(&self) -> DependencyKey {
        DependencyKey::new(self.cell.id(), VALUE)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.get_untracked())
            .finish()
    }
}
