//! Python Bindings
//!
//! Exposes the reactive core as the `_core` extension module:
//!
//! - `Reactive(dict | list)`: item access is tracked and triggers effects
//! - `Effect(callable)`: runs the callable now and again after each flush
//!   in which something it read changed
//! - `flush()`: run pending effects
//!
//! Everything lives in the runtime of the thread that created it, so the
//! classes are `unsendable`.

use pyo3::exceptions::{PyIndexError, PyKeyError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyString};

use crate::error::ReactiveError;
use crate::graph::Field;
use crate::reactive::{wrap, Effect, Reactive, Runtime, Tracked};
use crate::value::{List, Record, Value};

impl From<ReactiveError> for PyErr {
    fn from(err: ReactiveError) -> Self {
        match err {
            ReactiveError::IndexOutOfBounds { .. } => PyIndexError::new_err(err.to_string()),
            ReactiveError::NotARecord | ReactiveError::NotAList => {
                PyTypeError::new_err(err.to_string())
            }
            ReactiveError::Json(_) => PyValueError::new_err(err.to_string()),
            ReactiveError::CyclicUpdate(_) => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

fn to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool before int: Python's bool is an int subclass.
    if obj.is_instance_of::<PyBool>() {
        return Ok(Value::Bool(obj.extract()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Value::Float(obj.extract()?));
    }
    if let Ok(int) = obj.extract::<i64>() {
        return Ok(Value::Int(int));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Value::Str(obj.extract()?));
    }
    if let Ok(reactive) = obj.downcast::<PyReactive>() {
        return Ok(Value::from(&reactive.borrow().inner));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let record = Record::new();
        for (key, value) in dict.iter() {
            record.insert(key.extract::<String>()?, to_value(&value)?);
        }
        return Ok(record.into());
    }
    if let Ok(items) = obj.downcast::<PyList>() {
        let list = List::new();
        for item in items.iter() {
            list.push(to_value(&item)?);
        }
        return Ok(list.into());
    }
    Err(PyTypeError::new_err(format!("cannot store {obj} in a reactive value")))
}

fn to_py(py: Python<'_>, value: Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.into_py(py),
        Value::Int(i) => i.into_py(py),
        Value::Float(f) => f.into_py(py),
        Value::Str(s) => s.into_py(py),
        Value::Record(record) => Py::new(py, PyReactive { inner: wrap(record) })?.into_py(py),
        Value::List(list) => Py::new(py, PyReactive { inner: wrap(list) })?.into_py(py),
    })
}

fn json_to_py(py: Python<'_>, json: serde_json::Value) -> PyResult<PyObject> {
    use serde_json::Value as Json;

    Ok(match json {
        Json::Null => py.None(),
        Json::Bool(b) => b.into_py(py),
        Json::Number(n) => match n.as_i64() {
            Some(i) => i.into_py(py),
            None => n.as_f64().unwrap_or(f64::NAN).into_py(py),
        },
        Json::String(s) => s.into_py(py),
        Json::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_py(py)
        }
        Json::Object(fields) => {
            let dict = PyDict::new_bound(py);
            for (name, value) in fields {
                dict.set_item(name, json_to_py(py, value)?)?;
            }
            dict.into_py(py)
        }
    })
}

fn to_field(key: &Bound<'_, PyAny>) -> PyResult<Field> {
    if let Ok(name) = key.extract::<String>() {
        return Ok(Field::Name(name));
    }
    if let Ok(index) = key.extract::<usize>() {
        return Ok(Field::Index(index));
    }
    Err(PyTypeError::new_err("keys must be str or a non-negative int"))
}

/// Python-exposed reactive wrapper over a dict or list.
#[pyclass(name = "Reactive", unsendable)]
pub struct PyReactive {
    inner: Reactive,
}

#[pymethods]
impl PyReactive {
    #[new]
    fn new(value: &Bound<'_, PyAny>) -> PyResult<Self> {
        match to_value(value)?.as_target() {
            Some(target) => Ok(Self { inner: wrap(target) }),
            None => Err(PyTypeError::new_err("Reactive() takes a dict or a list")),
        }
    }

    fn __getitem__(&self, py: Python<'_>, key: &Bound<'_, PyAny>) -> PyResult<PyObject> {
        let field = to_field(key)?;
        match self.inner.get(field.clone()) {
            Some(Tracked::Value(value)) => to_py(py, value),
            Some(Tracked::Nested(inner)) => Ok(Py::new(py, PyReactive { inner })?.into_py(py)),
            None => match field {
                Field::Index(index) => Err(PyIndexError::new_err(index)),
                _ => Err(PyKeyError::new_err(key.clone().unbind())),
            },
        }
    }

    fn __setitem__(&self, key: &Bound<'_, PyAny>, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.set(to_field(key)?, to_value(value)?)?;
        Ok(())
    }

    fn __delitem__(&self, key: &str) -> PyResult<()> {
        match self.inner.remove(key)? {
            Some(_) => Ok(()),
            None => Err(PyKeyError::new_err(key.to_owned())),
        }
    }

    fn __contains__(&self, key: &Bound<'_, PyAny>) -> PyResult<bool> {
        Ok(self.inner.contains(to_field(key)?))
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn append(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.push(to_value(value)?)?;
        Ok(())
    }

    fn pop(&self, py: Python<'_>) -> PyResult<PyObject> {
        match self.inner.pop()? {
            Some(value) => to_py(py, value),
            None => Err(PyIndexError::new_err("pop from empty list")),
        }
    }

    fn keys(&self, py: Python<'_>) -> Vec<PyObject> {
        self.inner
            .keys()
            .into_iter()
            .map(|field| match field {
                Field::Name(name) => name.into_py(py),
                Field::Index(index) => index.into_py(py),
                Field::Keys => py.None(),
            })
            .collect()
    }

    /// Deep copy of the current state as plain dicts and lists.
    fn snapshot(&self, py: Python<'_>) -> PyResult<PyObject> {
        json_to_py(py, self.inner.snapshot())
    }

    fn __repr__(&self) -> String {
        format!("Reactive({})", self.inner.snapshot())
    }
}

/// Python-exposed effect wrapping a callable.
#[pyclass(name = "Effect", unsendable)]
pub struct PyEffect {
    inner: Effect,
}

#[pymethods]
impl PyEffect {
    #[new]
    fn new(callback: PyObject) -> Self {
        let inner = Effect::new(move || {
            Python::with_gil(|py| {
                if let Err(err) = callback.call0(py) {
                    tracing::error!(%err, "effect callback raised");
                    err.print(py);
                }
            });
        });
        Self { inner }
    }

    fn dispose(&self) {
        self.inner.dispose();
    }

    #[getter]
    fn disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    #[getter]
    fn run_count(&self) -> usize {
        self.inner.run_count()
    }
}

/// Run every pending effect.
#[pyfunction]
fn flush() -> PyResult<()> {
    Runtime::flush().map_err(ReactiveError::from)?;
    Ok(())
}

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyReactive>()?;
    m.add_class::<PyEffect>()?;
    m.add_function(wrap_pyfunction!(flush, m)?)?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
