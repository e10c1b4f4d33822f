//! Python bindings, built with the `python` feature.
//!
//! Exposes the engine as the `_core` extension module:
//!
//! ```python
//! from relax._core import Store, cell, computed
//!
//! count = cell(1)
//! doubled = computed(lambda read: read(count) * 2)
//!
//! store = Store()
//! off = store.effect(doubled, lambda old, new: print(old, "->", new))
//! store.set(count, 5)   # prints "2 -> 10"
//! off()
//! ```
//!
//! Python values are compared with `is` first and `==` second, so writing the
//! same object back is a no-op.
//!
//! `Store(config=None, *, notify_computed=None, isolate_effects=None)` takes
//! an optional JSON configuration, with keyword arguments applied on top.
//! Unless effects are isolated, an exception raised by an effect is re-raised
//! from the `Store.set` call that triggered it.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use pyo3::basic::CompareOp;
use pyo3::prelude::*;

use crate::config::{ConfigError, StoreConfig};
use crate::error::StoreError;
use crate::graph::NodeId;
use crate::reactive::{Cell, Change, Computed, Effect, Handle, Read, Store, Unsubscribe};
use crate::registry::Registry;

mod exceptions {
    use pyo3::create_exception;
    use pyo3::exceptions::PyException;

    create_exception!(_core, StoreError, PyException, "Base class for store errors.");
    create_exception!(_core, NotFoundError, StoreError, "The node is not registered.");
    create_exception!(
        _core,
        CircularDependencyError,
        StoreError,
        "A computed depends on itself."
    );
}

/// A Python object held by a node.
struct PyValue(PyObject);

impl Clone for PyValue {
    fn clone(&self) -> Self {
        Python::with_gil(|py| Self(self.0.clone_ref(py)))
    }
}

impl PartialEq for PyValue {
    fn eq(&self, other: &Self) -> bool {
        Python::with_gil(|py| {
            let this = self.0.bind(py);
            this.is(&other.0)
                || this
                    .rich_compare(&other.0, CompareOp::Eq)
                    .and_then(|result| result.is_truthy())
                    .unwrap_or(false)
        })
    }
}

fn config_err(err: ConfigError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

fn to_py_err(err: StoreError) -> PyErr {
    match &err {
        StoreError::External(inner) => match inner.downcast_ref::<PyErr>() {
            Some(original) => Python::with_gil(|py| original.clone_ref(py)),
            None => exceptions::StoreError::new_err(err.to_string()),
        },
        StoreError::NotFound(_) => exceptions::NotFoundError::new_err(err.to_string()),
        StoreError::CircularDependency { .. } => {
            exceptions::CircularDependencyError::new_err(err.to_string())
        }
        _ => exceptions::StoreError::new_err(err.to_string()),
    }
}

#[pyclass(name = "Cell", frozen)]
#[derive(Clone)]
struct PyCell {
    handle: Cell<PyValue>,
}

#[pymethods]
impl PyCell {
    #[getter]
    fn id(&self) -> String {
        self.handle.id().to_string()
    }

    fn __repr__(&self) -> String {
        format!("Cell({})", self.handle.id())
    }
}

#[pyclass(name = "Computed", frozen)]
#[derive(Clone)]
struct PyComputed {
    handle: Computed<PyValue>,
}

#[pymethods]
impl PyComputed {
    #[getter]
    fn id(&self) -> String {
        self.handle.id().to_string()
    }

    fn __repr__(&self) -> String {
        format!("Computed({})", self.handle.id())
    }
}

/// Either kind of node, as accepted from Python.
#[derive(FromPyObject)]
enum PyNode {
    Cell(PyCell),
    Computed(PyComputed),
}

impl PyNode {
    fn id(&self) -> NodeId {
        match self {
            Self::Cell(cell) => cell.handle.id(),
            Self::Computed(computed) => computed.handle.id(),
        }
    }

    fn get(&self, store: &Store) -> Result<PyValue, StoreError> {
        match self {
            Self::Cell(cell) => store.get(&cell.handle),
            Self::Computed(computed) => store.get(&computed.handle),
        }
    }

    fn read(&self, read: &Read) -> Result<PyValue, StoreError> {
        match self {
            Self::Cell(cell) => read.get(&cell.handle),
            Self::Computed(computed) => read.get(&computed.handle),
        }
    }
}

/// The accessor passed to Python compute functions: `read(node)`.
#[pyclass(name = "Reader")]
struct PyReader {
    read: Read,
}

#[pymethods]
impl PyReader {
    fn __call__(&self, node: PyNode) -> PyResult<PyObject> {
        node.read(&self.read).map(|value| value.0).map_err(to_py_err)
    }
}

#[pyclass(name = "Unsubscribe", frozen)]
struct PyUnsubscribe {
    inner: Unsubscribe,
}

#[pymethods]
impl PyUnsubscribe {
    fn __call__(&self) {
        self.inner.unsubscribe();
    }
}

#[pyclass(name = "Store")]
struct PyStore {
    store: Store,
    /// Effects keyed by node and Python callback identity, so passing the
    /// same callable twice maps to the same effect.
    effects: Mutex<HashMap<(NodeId, usize), Effect<PyValue>>>,
}

#[pymethods]
impl PyStore {
    #[new]
    #[pyo3(signature = (config=None, *, notify_computed=None, isolate_effects=None))]
    fn new(
        config: Option<String>,
        notify_computed: Option<bool>,
        isolate_effects: Option<bool>,
    ) -> PyResult<Self> {
        let mut config = StoreConfig::from_json_or_default(config.as_deref()).map_err(config_err)?;
        if let Some(enabled) = notify_computed {
            config = config.with_notify_computed(enabled);
        }
        if let Some(enabled) = isolate_effects {
            config = config.with_isolate_effects(enabled);
        }
        Ok(Self {
            store: Store::with_config(Arc::clone(Registry::global()), config),
            effects: Mutex::new(HashMap::new()),
        })
    }

    #[getter]
    fn config(&self) -> String {
        self.store.config().to_json()
    }

    fn get(&self, node: PyNode) -> PyResult<PyObject> {
        node.get(&self.store).map(|value| value.0).map_err(to_py_err)
    }

    fn set(&self, cell: PyCell, value: PyObject) -> PyResult<()> {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.store.set(&cell.handle, PyValue(value))));
        match outcome {
            Ok(result) => result.map_err(to_py_err),
            Err(payload) => match payload.downcast::<PyErr>() {
                Ok(err) => Err(*err),
                Err(payload) => panic::resume_unwind(payload),
            },
        }
    }

    /// Subscribe `callback(old, new)` to a node.
    fn effect(&self, node: PyNode, callback: PyObject) -> PyUnsubscribe {
        let key = (node.id(), callback.as_ptr() as usize);
        let isolate = self.store.config().isolate_effects;
        let effect = self
            .effects
            .lock()
            .entry(key)
            .or_insert_with(|| {
                Effect::new(move |change: &Change<PyValue>| call_effect(&callback, change, isolate))
            })
            .clone();

        let inner = match &node {
            PyNode::Cell(cell) => self.store.effect(&cell.handle, &effect),
            PyNode::Computed(computed) => self.store.effect(&computed.handle, &effect),
        };
        PyUnsubscribe { inner }
    }

    fn clear_effect(&self, node: PyNode, callback: PyObject) {
        let key = (node.id(), callback.as_ptr() as usize);
        let Some(effect) = self.effects.lock().remove(&key) else {
            return;
        };
        match &node {
            PyNode::Cell(cell) => self.store.clear_effect(&cell.handle, &effect),
            PyNode::Computed(computed) => self.store.clear_effect(&computed.handle, &effect),
        }
    }

    fn dispose(&self, node: PyNode) -> PyResult<()> {
        let id = node.id();
        self.effects.lock().retain(|(node, _), _| *node != id);
        let disposed = match &node {
            PyNode::Cell(cell) => self.store.dispose(&cell.handle),
            PyNode::Computed(computed) => self.store.dispose(&computed.handle),
        };
        disposed.map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.store)
    }
}

/// Run a Python effect.
///
/// A raised exception is logged and printed when effects are isolated.
/// Otherwise it unwinds out of the store with the `PyErr` as payload, and
/// `PyStore::set` raises it again.
fn call_effect(callback: &PyObject, change: &Change<PyValue>, isolate: bool) {
    let outcome = Python::with_gil(|py| {
        let args = (
            change.old_value.0.clone_ref(py),
            change.new_value.0.clone_ref(py),
        );
        callback.call1(py, args).map(drop)
    });
    let Err(err) = outcome else {
        return;
    };
    if isolate {
        tracing::error!(%err, "python effect raised");
        Python::with_gil(|py| err.print(py));
    } else {
        panic::resume_unwind(Box::new(err));
    }
}

fn call_compute(compute: &PyObject, read: &Read) -> Result<PyValue, StoreError> {
    Python::with_gil(|py| {
        let reader = Py::new(py, PyReader { read: read.clone() })?;
        compute.call1(py, (reader,)).map(PyValue)
    })
    .map_err(StoreError::external)
}

/// Create a cell with a default value.
#[pyfunction]
fn cell(value: PyObject) -> PyCell {
    PyCell {
        handle: Cell::new(PyValue(value)),
    }
}

/// Create a computed from `compute(read)`.
#[pyfunction]
fn computed(compute: PyObject) -> PyComputed {
    PyComputed {
        handle: Computed::new(move |read: &Read| call_compute(&compute, read)),
    }
}

pub(crate) fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add_class::<PyCell>()?;
    m.add_class::<PyComputed>()?;
    m.add_class::<PyReader>()?;
    m.add_class::<PyStore>()?;
    m.add_class::<PyUnsubscribe>()?;
    m.add_function(wrap_pyfunction!(cell, m)?)?;
    m.add_function(wrap_pyfunction!(computed, m)?)?;
    m.add("StoreError", py.get_type_bound::<exceptions::StoreError>())?;
    m.add("NotFoundError", py.get_type_bound::<exceptions::NotFoundError>())?;
    m.add(
        "CircularDependencyError",
        py.get_type_bound::<exceptions::CircularDependencyError>(),
    )?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
