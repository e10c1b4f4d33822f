//! Action and Plugin Tests
//!
//! These tests verify hook ordering around action dispatch and store-level
//! plugin management.

use std::fmt;
use std::sync::{Arc, Mutex};

use relax_core::{
    dispatch, Action, ActionContext, Cell, Plugin, Store, StoreError, TracingPlugin,
};

type Log = Arc<Mutex<Vec<String>>>;

/// Plugin that records every hook it sees, tagged with its name.
struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
        })
    }

    fn push(&self, event: String) {
        self.log.lock().unwrap().push(format!("{}:{event}", self.name));
    }
}

impl Plugin for Recorder {
    fn name(&self) -> Option<&str> {
        Some(self.name)
    }

    fn on_before(&self, context: &ActionContext<'_>) {
        self.push(format!("before {}", context.name.unwrap_or("?")));
    }

    fn on_after(&self, _context: &ActionContext<'_>, result: &dyn fmt::Debug) {
        self.push(format!("after {result:?}"));
    }

    fn on_error(&self, _context: &ActionContext<'_>, error: &StoreError) {
        self.push(format!("error {error}"));
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Test that store plugins run before action plugins, around the handler.
#[test]
fn store_plugins_run_before_action_plugins() {
    let log: Log = Arc::default();
    let total = Cell::new(0_i32);

    let handler_log = log.clone();
    let add = Action::named("add", move |store: &Store, amount: &i32| {
        handler_log.lock().unwrap().push(String::from("handler"));
        store.update(&total, |current| current + amount)?;
        store.get(&total)
    })
    .with_plugin(Recorder::new("action", &log));

    let store = Store::new();
    store.use_plugin(Recorder::new("store", &log));

    assert_eq!(dispatch(&add, &store, 4).unwrap(), 4);
    assert_eq!(
        entries(&log),
        vec![
            "store:before add",
            "action:before add",
            "handler",
            "store:after 4",
            "action:after 4",
        ]
    );
}

/// Test that handler errors reach on_error hooks and the caller unchanged.
#[test]
fn handler_errors_run_error_hooks() {
    let log: Log = Arc::default();
    let store = Store::new();
    store.use_plugin(Recorder::new("store", &log));

    let reject = Action::named("reject", |_store: &Store, reason: &String| -> relax_core::Result<()> {
        Err(StoreError::msg(reason.clone()))
    });

    let err = reject.call(&store, String::from("not allowed")).unwrap_err();
    assert_eq!(err.to_string(), "not allowed");
    assert_eq!(
        entries(&log),
        vec!["store:before reject", "store:error not allowed"]
    );
}

/// Test that state written by a failing handler before the error stays.
#[test]
fn failed_actions_do_not_roll_back() {
    let balance = Cell::new(10_i64);
    let withdraw = Action::named("withdraw", move |store: &Store, amount: &i64| {
        store.update(&balance, |b| b - amount)?;
        let left = store.get(&balance)?;
        if left < 0 {
            return Err(StoreError::msg("overdrawn"));
        }
        Ok(left)
    });
    let store = Store::new();

    assert_eq!(withdraw.call(&store, 4).unwrap(), 6);
    assert!(withdraw.call(&store, 10).is_err());
    assert_eq!(store.get(&balance).unwrap(), -4);
}

/// Test that removed plugins no longer observe dispatches.
#[test]
fn removed_plugins_stop_observing() {
    let log: Log = Arc::default();
    let store = Store::new();
    store.use_plugin(Recorder::new("audit", &log));
    store.use_plugin(Arc::new(TracingPlugin::default()));

    let noop = Action::new(|_store: &Store, _: &()| Ok(()));
    noop.call(&store, ()).unwrap();
    assert_eq!(entries(&log).len(), 2);

    assert!(store.remove_plugin("audit"));
    assert!(!store.remove_plugin("audit"));
    assert_eq!(store.plugins().len(), 1);

    noop.call(&store, ()).unwrap();
    assert_eq!(entries(&log).len(), 2);

    store.clear_plugins();
    assert!(store.plugins().is_empty());
}

/// Test that plugins attached to a store do not leak into other stores.
#[test]
fn plugins_are_scoped_to_their_store() {
    let log: Log = Arc::default();
    let observed = Store::new();
    let quiet = Store::new();
    observed.use_plugin(Recorder::new("observed", &log));

    let ping = Action::named("ping", |_store: &Store, _: &()| Ok("pong"));
    ping.call(&quiet, ()).unwrap();
    assert!(entries(&log).is_empty());

    ping.call(&observed, ()).unwrap();
    assert_eq!(
        entries(&log),
        vec!["observed:before ping", "observed:after \"pong\""]
    );
}
