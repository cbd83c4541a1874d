//! Reactive Wrapper
//!
//! [`Reactive`] is a transparent proxy over one record or list. Reads go
//! through [`Runtime::track`], writes go through [`Runtime::trigger`]; the
//! target itself is never copied.
//!
//! # Nested Values
//!
//! Reading a field that holds a record or list returns that target wrapped
//! as well. Wrappers are created lazily and cached per target, so reading
//! the same nested value twice gives back the same wrapper
//! ([`Reactive::ptr_eq`]). The cache only holds weak references; a wrapper
//! nobody holds is dropped along with its cache entry.
//!
//! # Bypassing the Wrapper
//!
//! The raw target stays reachable through [`Reactive::target`] or through
//! any handle the caller kept. Access that way is untracked: effects will
//! not see those writes. Allowed, but it breaks the guarantees above.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::runtime::Runtime;
use crate::error::{ReactiveError, Result};
use crate::graph::{DependencyKey, Field, TargetId};
use crate::value::{List, Record, Shape, Target, Value, WriteOutcome};

thread_local! {
    /// Target identity -> live wrapper.
    static WRAPPERS: RefCell<HashMap<TargetId, Weak<WrapperInner>>> = RefCell::new(HashMap::new());
}

struct WrapperInner {
    target: Target,
}

impl Drop for WrapperInner {
    fn drop(&mut self) {
        let id = self.target.id();
        let _ = WRAPPERS.try_with(|cache| {
            if let Ok(mut cache) = cache.try_borrow_mut() {
                // A newer wrapper may already have taken the slot.
                if cache.get(&id).is_some_and(|weak| weak.strong_count() == 0) {
                    cache.remove(&id);
                }
            }
        });
    }
}

/// Wrap `target` so that reads are tracked and writes notify dependents.
///
/// Wrapping the same target twice returns the same wrapper while the first
/// one is still alive.
pub fn wrap(target: impl Into<Target>) -> Reactive {
    let target = target.into();
    let id = target.id();

    WRAPPERS.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(inner) = cache.get(&id).and_then(Weak::upgrade) {
            return Reactive { inner };
        }

        let inner = Rc::new(WrapperInner { target });
        cache.insert(id, Rc::downgrade(&inner));
        Reactive { inner }
    })
}

/// A reactive view over a record or list.
#[derive(Clone)]
pub struct Reactive {
    inner: Rc<WrapperInner>,
}

/// The result of a tracked read.
#[derive(Debug, Clone)]
pub enum Tracked {
    /// A scalar.
    Value(Value),

    /// A record or list, already wrapped.
    Nested(Reactive),
}

impl Tracked {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Tracked::Value(value) => value.as_int(),
            Tracked::Nested(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Tracked::Value(value) => value.as_float(),
            Tracked::Nested(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Tracked::Value(value) => value.as_bool(),
            Tracked::Nested(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tracked::Value(value) => value.as_str(),
            Tracked::Nested(_) => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Tracked::Nested(reactive) => Some(reactive),
            Tracked::Value(_) => None,
        }
    }

    /// Back to a plain value. Nested wrappers give up their raw target.
    pub fn into_value(self) -> Value {
        match self {
            Tracked::Value(value) => value,
            Tracked::Nested(reactive) => reactive.target().into(),
        }
    }
}

impl From<Value> for Tracked {
    fn from(value: Value) -> Self {
        match value.as_target() {
            Some(target) => Tracked::Nested(wrap(target)),
            None => Tracked::Value(value),
        }
    }
}

impl Reactive {
    /// Wrap a new record built from `fields`.
    pub fn record<K, V, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        wrap(fields.into_iter().collect::<Record>())
    }

    /// Wrap a new list built from `items`.
    pub fn list<V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        wrap(items.into_iter().collect::<List>())
    }

    /// Wrap a JSON object or array.
    pub fn from_json(json: &str) -> Result<Self> {
        match Value::from_json(json)?.as_target() {
            Some(target) => Ok(wrap(target)),
            None => Err(ReactiveError::NotARecord),
        }
    }

    /// Identity of the wrapped target.
    pub fn id(&self) -> TargetId {
        self.inner.target.id()
    }

    /// The raw target. Access through it is untracked.
    pub fn target(&self) -> Target {
        self.inner.target.clone()
    }

    /// Whether two handles are the same wrapper instance.
    pub fn ptr_eq(a: &Reactive, b: &Reactive) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    fn key(&self, field: impl Into<Field>) -> DependencyKey {
        DependencyKey::new(self.id(), field)
    }

    /// Read a field, tracking it for the current effect.
    ///
    /// Missing fields read as `None`.
    pub fn get(&self, field: impl Into<Field>) -> Option<Tracked> {
        let field = field.into();
        let value = self.inner.target.read(&field);
        Runtime::track(self.key(field));
        value.map(Tracked::from)
    }

    /// Write a field and notify its dependents.
    ///
    /// Writing the value already stored is a no-op. Creating a field also
    /// notifies whatever iterates the target's keys. Storing a wrapper
    /// stores its raw target.
    pub fn set(&self, field: impl Into<Field>, value: impl Into<Value>) -> Result<WriteOutcome> {
        let field = field.into();
        let outcome = self.inner.target.write(&field, value.into())?;

        match outcome {
            WriteOutcome::Unchanged => {}
            WriteOutcome::Updated => Runtime::trigger(&self.key(field)),
            WriteOutcome::Added => {
                Runtime::trigger(&self.key(field));
                Runtime::trigger(&DependencyKey::keys(self.id()));
            }
        }
        Ok(outcome)
    }

    /// Read-modify-write of a field.
    ///
    /// The read is untracked, so an effect that bumps a counter does not
    /// subscribe to it.
    pub fn update<F>(&self, field: impl Into<Field>, f: F) -> Result<WriteOutcome>
    where
        F: FnOnce(Option<Value>) -> Value,
    {
        let field = field.into();
        let current = self.inner.target.read(&field);
        self.set(field, f(current))
    }

    /// Whether the target has `field`. Tracks the field.
    pub fn contains(&self, field: impl Into<Field>) -> bool {
        self.get(field).is_some()
    }

    /// Remove a record field, notifying the field and key-set dependents.
    pub fn remove(&self, name: &str) -> Result<Option<Value>> {
        let Target::Record(record) = &self.inner.target else {
            return Err(ReactiveError::NotARecord);
        };

        let removed = record.remove(name);
        if removed.is_some() {
            Runtime::trigger(&self.key(name));
            Runtime::trigger(&DependencyKey::keys(self.id()));
        }
        Ok(removed)
    }

    /// Append to a list.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        let Target::List(list) = &self.inner.target else {
            return Err(ReactiveError::NotAList);
        };

        let index = list.len();
        list.push(value);
        Runtime::trigger(&self.key(index));
        Runtime::trigger(&DependencyKey::keys(self.id()));
        Ok(())
    }

    /// Remove the last element of a list.
    pub fn pop(&self) -> Result<Option<Value>> {
        let Target::List(list) = &self.inner.target else {
            return Err(ReactiveError::NotAList);
        };

        let popped = list.pop();
        if popped.is_some() {
            Runtime::trigger(&self.key(list.len()));
            Runtime::trigger(&DependencyKey::keys(self.id()));
        }
        Ok(popped)
    }

    /// Fields of the target in order: names for records, indices for lists.
    ///
    /// Tracks the key set, so the current effect re-runs when fields are
    /// added or removed.
    pub fn keys(&self) -> Vec<Field> {
        Runtime::track(DependencyKey::keys(self.id()));
        match &self.inner.target {
            Target::Record(record) => record.keys().into_iter().map(Field::Name).collect(),
            Target::List(list) => (0..list.len()).map(Field::Index).collect(),
        }
    }

    /// Number of fields or elements. Tracks the key set.
    pub fn len(&self) -> usize {
        Runtime::track(DependencyKey::keys(self.id()));
        self.inner.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Untracked deep copy of the current state.
    pub fn snapshot(&self) -> serde_json::Value {
        Value::from(self.target()).to_json()
    }
}

impl From<Reactive> for Value {
    fn from(reactive: Reactive) -> Self {
        reactive.target().into()
    }
}

impl From<&Reactive> for Value {
    fn from(reactive: &Reactive) -> Self {
        reactive.target().into()
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.inner.target).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::reactive::Effect;

    #[test]
    fn read_tracks_only_inside_effects() {
        let state = Reactive::record([("x", 1)]);
        let key = DependencyKey::new(state.id(), "x");

        assert_eq!(state.get("x").and_then(|v| v.as_int()), Some(1));
        assert_eq!(Runtime::dependent_count(&key), 0);

        let s = state.clone();
        let effect = Effect::new(move || {
            s.get("x");
        });
        assert_eq!(Runtime::dependent_count(&key), 1);
        effect.dispose();
    }

    #[test]
    fn wrapping_twice_returns_same_wrapper() {
        let record = Record::from_iter([("x", 1)]);
        let a = wrap(record.clone());
        let b = wrap(record);

        assert!(Reactive::ptr_eq(&a, &b));
    }

    #[test]
    fn nested_reads_return_cached_wrapper() {
        let inner = Record::from_iter([("y", 2)]);
        let outer = Reactive::record([("inner", inner.clone())]);

        let first = outer.get("inner").unwrap();
        let second = outer.get("inner").unwrap();
        let (first, second) = (first.as_reactive().unwrap(), second.as_reactive().unwrap());

        assert!(Reactive::ptr_eq(first, second));
        assert_eq!(first.id(), inner.id());
    }

    #[test]
    fn set_reports_outcome() {
        let state = Reactive::record([("x", 1)]);

        assert_eq!(state.set("x", 1).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(state.set("x", 2).unwrap(), WriteOutcome::Updated);
        assert_eq!(state.set("y", 3).unwrap(), WriteOutcome::Added);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn list_operations() {
        let list = Reactive::list([1, 2]);

        list.push(3).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.pop().unwrap(), Some(Value::Int(3)));
        assert!(matches!(
            list.set(7usize, 0),
            Err(ReactiveError::IndexOutOfBounds { index: 7, len: 2 })
        ));
        assert!(matches!(list.remove("x"), Err(ReactiveError::NotARecord)));

        let record = Reactive::record([("x", 1)]);
        assert!(matches!(record.push(1), Err(ReactiveError::NotAList)));
    }

    #[test]
    fn update_does_not_track_its_read() {
        let state = Reactive::record([("n", 1)]);
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (state.clone(), Rc::clone(&runs));
        let effect = Effect::new(move || {
            r.set(r.get() + 1);
            s.update("n", |n| Value::Int(n.and_then(|n| n.as_int()).unwrap_or(0) + 1))
                .unwrap();
        });

        assert_eq!(effect.dependency_count(), 0);
        assert_eq!(Runtime::pending_count(), 0);
        assert_eq!(state.get("n").and_then(|v| v.as_int()), Some(2));
        effect.dispose();
    }

    #[test]
    fn storing_a_wrapper_stores_its_target() {
        let child = Reactive::record([("z", 0)]);
        let parent = Reactive::record(Vec::<(&str, Value)>::new());

        parent.set("child", &child).unwrap();
        let read = parent.get("child").unwrap();
        assert!(Reactive::ptr_eq(read.as_reactive().unwrap(), &child));
    }

    #[test]
    fn snapshot_is_deep_json() {
        let state = Reactive::from_json(r#"{ "a": 1, "b": [true, "x"] }"#).unwrap();
        assert_eq!(state.snapshot(), serde_json::json!({ "a": 1, "b": [true, "x"] }));

        assert!(matches!(Reactive::from_json("1"), Err(ReactiveError::NotARecord)));
    }

    #[test]
    fn dropped_wrappers_leave_the_cache() {
        let record = Record::new();
        let id = record.id();

        drop(wrap(record.clone()));
        assert!(WRAPPERS.with(|cache| !cache.borrow().contains_key(&id)));

        let _kept = wrap(record);
        assert!(WRAPPERS.with(|cache| cache.borrow().contains_key(&id)));
    }
}
