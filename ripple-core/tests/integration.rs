//! Integration Tests for Reactive System
//!
//! These tests verify that wrappers, effects, the scheduler and derived
//! values work together correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ripple_core::graph::{DependencyKey, Field};
use ripple_core::reactive::{
    batch, dispose, effect, untracked, wrap, Computed, Effect, Reactive, Ref, Runtime,
};
use ripple_core::value::{Record, Value};
use ripple_core::{ReactiveError, RuntimeConfig};

fn int(state: &Reactive, field: &str) -> i64 {
    state.get(field).and_then(|v| v.as_int()).unwrap_or_default()
}

/// Counts runs and remembers the last observed value of `field`.
fn observe(state: &Reactive, field: &'static str) -> (Effect, Rc<Cell<usize>>, Rc<Cell<i64>>) {
    let runs = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(0));

    let (s, r, v) = (state.clone(), Rc::clone(&runs), Rc::clone(&seen));
    let effect = Effect::new(move || {
        r.set(r.get() + 1);
        v.set(int(&s, field));
    });
    (effect, runs, seen)
}

/// Writing a field re-runs the effect that read it, once, at the next flush.
#[test]
fn basic_propagation() {
    let state = Reactive::record([("x", 1)]);
    let (_effect, runs, seen) = observe(&state, "x");

    assert_eq!(runs.get(), 1);
    assert_eq!(seen.get(), 1);

    state.set("x", 2).unwrap();
    // Nothing happens until the flush.
    assert_eq!(runs.get(), 1);

    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 2);
    assert_eq!(seen.get(), 2);
}

/// Writing the value already stored triggers nothing.
#[test]
fn equal_write_is_a_noop() {
    let state = Reactive::record([("x", 1)]);
    let (_effect, runs, _) = observe(&state, "x");

    state.set("x", 1).unwrap();
    assert_eq!(Runtime::pending_count(), 0);

    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 1);
}

/// Several writes before a flush cost one run that sees the final value.
#[test]
fn writes_are_batched() {
    let state = Reactive::record([("x", 1), ("y", 1)]);

    let runs = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (s, r, v) = (state.clone(), Rc::clone(&runs), Rc::clone(&seen));
    let _effect = Effect::new(move || {
        r.set(r.get() + 1);
        v.borrow_mut().push((int(&s, "x"), int(&s, "y")));
    });

    batch(|| {
        state.set("x", 2).unwrap();
        state.set("x", 3).unwrap();
        state.set("y", 4).unwrap();
    })
    .unwrap();

    assert_eq!(runs.get(), 2);
    assert_eq!(*seen.borrow(), vec![(1, 1), (3, 4)]);
}

/// A branch that is no longer read stops triggering the effect.
#[test]
fn stale_dependencies_are_pruned() {
    let state = Reactive::record([("flag", Value::Bool(true)), ("a", Value::Int(1)), ("b", Value::Int(1))]);
    let runs = Rc::new(Cell::new(0));

    let (s, r) = (state.clone(), Rc::clone(&runs));
    let effect = Effect::new(move || {
        r.set(r.get() + 1);
        let flag = s.get("flag").and_then(|v| v.as_bool()).unwrap_or(false);
        if flag {
            s.get("a");
        } else {
            s.get("b");
        }
    });
    assert_eq!(effect.dependency_count(), 2);

    state.set("flag", false).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 2);

    // `a` is no longer read.
    state.set("a", 2).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 2);
    assert_eq!(Runtime::dependent_count(&DependencyKey::new(state.id(), "a")), 0);

    // `b` is.
    state.set("b", 2).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 3);
}

/// Disposed effects never run again and leave no registry entries behind.
#[test]
fn disposed_effect_does_not_run() {
    let state = Reactive::record([("x", 1), ("y", 1)]);
    let before = Runtime::tracked_key_count();

    let runs = Rc::new(Cell::new(0));
    let (s, r) = (state.clone(), Rc::clone(&runs));
    let handle = effect(move || {
        r.set(r.get() + 1);
        s.get("x");
        s.get("y");
    });
    assert_eq!(Runtime::tracked_key_count(), before + 2);

    state.set("x", 2).unwrap();
    dispose(handle);
    assert_eq!(Runtime::tracked_key_count(), before);

    state.set("y", 2).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 1);

    // Idempotent
    dispose(handle);
    assert!(handle.is_disposed());
}

/// An effect that always writes what it reads is reported, not looped on.
#[test]
fn self_feeding_effect_is_a_cyclic_update() {
    let state = Reactive::record([("n", 0)]);

    let s = state.clone();
    let looping = Effect::new(move || {
        let n = int(&s, "n");
        s.set("n", n + 1).unwrap();
    });

    let err = Runtime::flush().unwrap_err();
    assert_eq!(err.effect, looping.id());
    assert_eq!(err.runs, RuntimeConfig::default().max_reruns_per_flush);

    // The queue is cleared; the runtime is usable again.
    assert_eq!(Runtime::pending_count(), 0);
    looping.dispose();
    Runtime::flush().unwrap();
}

/// The rerun limit comes from the runtime configuration.
#[test]
fn cyclic_limit_is_configurable() {
    Runtime::configure(RuntimeConfig::from_json(r#"{ "max_reruns_per_flush": 3 }"#).unwrap());

    let state = Reactive::record([("n", 0)]);
    let runs = Rc::new(Cell::new(0));
    let (s, r) = (state.clone(), Rc::clone(&runs));
    let _effect = Effect::new(move || {
        r.set(r.get() + 1);
        let n = int(&s, "n");
        s.set("n", n + 1).unwrap();
    });

    let err: ReactiveError = Runtime::flush().unwrap_err().into();
    assert!(matches!(err, ReactiveError::CyclicUpdate(e) if e.runs == 3));
    // One run at registration, three in the aborted flush.
    assert_eq!(runs.get(), 4);

    Runtime::configure(RuntimeConfig::default());
}

/// An effect that converges (writes a value once, then the same value) is fine.
#[test]
fn converging_self_write_settles() {
    let state = Reactive::record([("n", 0)]);

    let s = state.clone();
    let _effect = Effect::new(move || {
        let n = int(&s, "n");
        let next = if n < 5 { n + 1 } else { n };
        s.set("n", next).unwrap();
    });

    Runtime::flush().unwrap();
    assert_eq!(int(&state, "n"), 5);
}

/// Effects run in the order they were first scheduled.
#[test]
fn effects_run_in_schedule_order() {
    let state = Reactive::record([("a", 0), ("b", 0)]);
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut effects = Vec::new();
    for (name, field) in [("first", "b"), ("second", "a")] {
        let (s, o) = (state.clone(), Rc::clone(&order));
        effects.push(Effect::new(move || {
            s.get(field);
            o.borrow_mut().push(name);
        }));
    }
    order.borrow_mut().clear();

    state.set("a", 1).unwrap();
    state.set("b", 1).unwrap();
    state.set("a", 2).unwrap();
    Runtime::flush().unwrap();

    assert_eq!(*order.borrow(), vec!["second", "first"]);
}

/// Reading a nested record twice gives back the same wrapper, and nested
/// writes are tracked.
#[test]
fn nested_values_are_wrapped_once() {
    let state = Reactive::from_json(r#"{ "user": { "name": "John" } }"#).unwrap();

    let first = state.get("user").unwrap();
    let second = state.get("user").unwrap();
    let user = first.as_reactive().unwrap();
    assert!(Reactive::ptr_eq(user, second.as_reactive().unwrap()));

    let seen = Rc::new(RefCell::new(String::new()));
    let (s, v) = (state.clone(), Rc::clone(&seen));
    let _effect = Effect::new(move || {
        let user = s.get("user").unwrap();
        let name = user.as_reactive().unwrap().get("name").unwrap();
        *v.borrow_mut() = name.as_str().unwrap_or_default().to_owned();
    });
    assert_eq!(*seen.borrow(), "John");

    user.set("name", "Naruto").unwrap();
    Runtime::flush().unwrap();
    assert_eq!(*seen.borrow(), "Naruto");
}

/// Adding or removing a field notifies effects that iterate the keys.
#[test]
fn key_set_changes_notify_iterators() {
    let state = Reactive::record([("first_name", "John")]);
    let keys = Rc::new(RefCell::new(Vec::new()));

    let (s, k) = (state.clone(), Rc::clone(&keys));
    let _effect = Effect::new(move || *k.borrow_mut() = s.keys());
    assert_eq!(*keys.borrow(), vec![Field::from("first_name")]);

    // Updating an existing field does not touch the key set.
    state.set("first_name", "Naruto").unwrap();
    assert_eq!(Runtime::pending_count(), 0);

    state.set("last_name", "Uzumaki").unwrap();
    Runtime::flush().unwrap();
    assert_eq!(keys.borrow().len(), 2);

    state.remove("first_name").unwrap();
    Runtime::flush().unwrap();
    assert_eq!(*keys.borrow(), vec![Field::from("last_name")]);
}

/// Lists track indices and length.
#[test]
fn list_length_is_tracked() {
    let items = Reactive::list([1, 2]);
    let total = Rc::new(Cell::new(0));

    let (l, t) = (items.clone(), Rc::clone(&total));
    let _effect = Effect::new(move || {
        let sum = (0..l.len())
            .filter_map(|i| l.get(i).and_then(|v| v.as_int()))
            .sum::<i64>();
        t.set(sum);
    });
    assert_eq!(total.get(), 3);

    items.push(10).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(total.get(), 13);

    items.set(0usize, 5).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(total.get(), 17);
}

/// Writes straight to the raw target bypass tracking.
#[test]
fn raw_access_bypasses_tracking() {
    let record = Record::from_iter([("x", 1)]);
    let state = wrap(record.clone());
    let (_effect, runs, _) = observe(&state, "x");

    record.insert("x", 99);
    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 1);
    assert_eq!(int(&state, "x"), 99);
}

/// Reads inside `untracked` create no dependencies.
#[test]
fn untracked_reads_do_not_subscribe() {
    let state = Reactive::record([("x", 1)]);

    let s = state.clone();
    let effect = Effect::new(move || {
        untracked(|| s.get("x"));
    });
    assert_eq!(effect.dependency_count(), 0);
}

/// The flush hook is asked once per batch of writes.
#[test]
fn flush_hook_drives_flushing() {
    let requested = Rc::new(Cell::new(0));
    let r = Rc::clone(&requested);
    Runtime::set_flush_hook(move || r.set(r.get() + 1));

    let state = Reactive::record([("x", 1)]);
    let (_effect, runs, _) = observe(&state, "x");

    state.set("x", 2).unwrap();
    state.set("x", 3).unwrap();
    assert_eq!(requested.get(), 1);

    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 2);

    state.set("x", 4).unwrap();
    assert_eq!(requested.get(), 2);

    Runtime::clear_flush_hook();
}

/// Writes made before a hook is installed still get flushed through it.
#[test]
fn hook_installed_after_writes_is_asked_to_flush() {
    let state = Reactive::record([("x", 1), ("y", 1)]);
    let (_fx, x_runs, _) = observe(&state, "x");
    let (_fy, y_runs, _) = observe(&state, "y");

    state.set("x", 2).unwrap();

    let requested = Rc::new(Cell::new(0));
    let r = Rc::clone(&requested);
    Runtime::set_flush_hook(move || r.set(r.get() + 1));
    assert_eq!(requested.get(), 1);

    state.set("y", 2).unwrap();
    assert_eq!(Runtime::pending_count(), 2);
    assert_eq!(requested.get(), 1);

    Runtime::flush().unwrap();
    assert_eq!((x_runs.get(), y_runs.get()), (2, 2));

    Runtime::clear_flush_hook();
}

/// Effects still registered when their thread ends are torn down quietly,
/// including those holding computed values and guards.
#[test]
fn live_effects_survive_thread_exit() {
    let handle = std::thread::spawn(|| {
        let count = Ref::new(1);
        let c = count.clone();
        let doubled = Computed::new(move || c.get().as_int().unwrap_or_default() * 2);

        let inner = Effect::new({
            let count = count.clone();
            move || {
                count.get();
            }
        })
        .guard();

        let seen = Rc::new(Cell::new(0));
        let (d, s) = (doubled.clone(), Rc::clone(&seen));
        Effect::new(move || {
            let _keep = &inner;
            s.set(d.get().as_int().unwrap_or_default());
        });

        count.set(4).unwrap();
        Runtime::flush().unwrap();
        seen.get()
    });

    assert_eq!(handle.join().unwrap(), 8);
}

/// A computed value dropped at thread exit, with nothing else alive.
#[test]
fn computed_read_by_effect_is_dropped_at_thread_exit() {
    let handle = std::thread::spawn(|| {
        let state = Reactive::record([("n", 3)]);
        let s = state.clone();
        let squared = Computed::new(move || int(&s, "n") * int(&s, "n"));
        Effect::new(move || {
            squared.get();
        });
        Runtime::effect_count()
    });

    assert_eq!(handle.join().unwrap(), 2);
}

/// Computed values and refs compose with effects.
#[test]
fn derived_state_chain() {
    let first = Ref::new("John");
    let last = Ref::new("Doe");

    let (f, l) = (first.clone(), last.clone());
    let full = Computed::new(move || {
        format!(
            "{} {}",
            f.get().as_str().unwrap_or_default(),
            l.get().as_str().unwrap_or_default()
        )
    });

    let rendered = Rc::new(RefCell::new(String::new()));
    let (c, out) = (full.clone(), Rc::clone(&rendered));
    let _effect = Effect::new(move || {
        *out.borrow_mut() = c.get().as_str().unwrap_or_default().to_owned();
    });
    assert_eq!(*rendered.borrow(), "John Doe");

    batch(|| {
        first.set("Naruto").unwrap();
        last.set("Uzumaki").unwrap();
    })
    .unwrap();
    assert_eq!(*rendered.borrow(), "Naruto Uzumaki");
}

/// Guards dispose their effect when they go out of scope.
#[test]
fn guard_scopes_an_effect() {
    let state = Reactive::record([("x", 1)]);
    let runs = Rc::new(Cell::new(0));
    let before = Runtime::tracked_key_count();

    {
        let (s, r) = (state.clone(), Rc::clone(&runs));
        let _guard = Effect::new(move || {
            r.set(r.get() + 1);
            s.get("x");
        })
        .guard();
    }

    state.set("x", 2).unwrap();
    Runtime::flush().unwrap();
    assert_eq!(runs.get(), 1);
    assert_eq!(Runtime::tracked_key_count(), before);
}
