//! Integration tests for `#[operations]`-driven instrumentation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quillsign_instrument::{
    InstrumentError, Instrumented, OperationDecl, OperationSet, Operations, PlannedOperation,
    operations,
};
use serde::Serialize;
use serde_json::{Value, json};

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum TestError {
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Record {
    id: String,
}

/// Shared event log: `(event, payload)` plus markers from operation bodies.
type Log = Arc<Mutex<Vec<(String, Value)>>>;

#[derive(Default)]
struct Records {
    log: Log,
    executions: AtomicUsize,
}

#[operations]
impl Records {
    async fn create(&self, name: String) -> Result<Record, TestError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .push(("body:create".to_string(), json!(name)));
        Ok(Record {
            id: format!("r-{}", self.executions.load(Ordering::SeqCst)),
        })
    }

    async fn rename(&self, id: &str, name: &str) -> Result<Record, TestError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if name.is_empty() {
            return Err(TestError::Rejected(id.to_string()));
        }
        Ok(Record { id: id.to_string() })
    }

    async fn count(&self) -> Result<usize, TestError> {
        Ok(self.executions.load(Ordering::SeqCst))
    }

    #[exempt]
    async fn purge(&self) -> usize {
        self.executions.swap(0, Ordering::SeqCst)
    }

    async fn annotate<T: Into<String>>(&self, note: T) -> Result<String, TestError> {
        Ok(note.into())
    }

    /// Not an operation: synchronous.
    fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

fn record_events(instance: &Instrumented<Records>, log: &Log, events: &[&'static str]) {
    let hooks = instance.hooks().expect("registry attached");
    for &event in events {
        let log = Arc::clone(log);
        hooks
            .register(event, move |payload| {
                log.lock().unwrap().push((event.to_string(), payload.clone()));
            })
            .unwrap();
    }
}

fn event_names(log: &Log) -> Vec<String> {
    log.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
}

// ─────────────────────────────────────────────────────────────────────
// 1. Begin / after ordering
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn begin_fires_before_body_and_after_fires_once_resolved() {
    let records = Records::default();
    let log = Arc::clone(&records.log);
    let records = Instrumented::new(records).unwrap();
    record_events(&records, &log, &["onBeginCreate", "onAfterCreate"]);

    records.create("a".to_string()).await.unwrap();

    assert_eq!(
        event_names(&log),
        vec!["onBeginCreate", "body:create", "onAfterCreate"]
    );
}

#[tokio::test]
async fn exempt_operation_fires_nothing() {
    let records = Records::default();
    let log = Arc::clone(&records.log);
    let records = Instrumented::new(records).unwrap();
    record_events(&records, &log, &["onBeginPurge", "onAfterPurge"]);

    records.create("a".to_string()).await.unwrap();
    log.lock().unwrap().clear();

    assert_eq!(records.purge().await, 1);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(records.plan().get("purge"), Some(&PlannedOperation::Exempt));
}

#[tokio::test]
async fn begin_payload_carries_full_argument_list() {
    let records = Records::default();
    let log = Arc::clone(&records.log);
    let records = Instrumented::new(records).unwrap();
    record_events(&records, &log, &["onBeginRename", "onBeginCount"]);

    records.rename("r-9", "lease").await.unwrap();
    records.count().await.unwrap();

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        vec![
            ("onBeginRename".to_string(), json!(["r-9", "lease"])),
            ("onBeginCount".to_string(), json!([])),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// 2. Return-value transparency
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrapped_and_unwrapped_results_match() {
    let plain = Records::default();
    let unwrapped = plain.rename("abc", "x").await.unwrap();

    let records = Instrumented::new(Records::default()).unwrap();
    let captured = Arc::new(Mutex::new(None));
    let captured_clone = Arc::clone(&captured);
    records
        .hooks()
        .unwrap()
        .register("onAfterRename", move |value| {
            *captured_clone.lock().unwrap() = Some(value.clone());
        })
        .unwrap();

    let wrapped = records.rename("abc", "x").await.unwrap();
    assert_eq!(wrapped, unwrapped);
    assert_eq!(wrapped, Record { id: "abc".into() });
    assert_eq!(captured.lock().unwrap().take(), Some(json!({"id": "abc"})));
}

// ─────────────────────────────────────────────────────────────────────
// 3. Fail-fast without a registry
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_registry_fails_before_the_operation_runs() {
    let records = Instrumented::detached(Records::default()).unwrap();

    for result in [
        records.create("a".to_string()).await.map(|_| ()),
        records.rename("a", "b").await.map(|_| ()),
        records.count().await.map(|_| ()),
    ] {
        let err = result.unwrap_err();
        assert!(
            matches!(err, TestError::Instrument(ref e) if e.is_hooks_not_initialized()),
            "got: {err}"
        );
    }
    assert_eq!(records.inner().executions(), 0);
}

#[tokio::test]
async fn missing_registry_does_not_affect_exempt_or_dynamic_operations() {
    let records = Instrumented::detached(Records::default()).unwrap();
    assert_eq!(records.purge().await, 0);
    assert_eq!(records.annotate("note").await.unwrap(), "note");
}

// ─────────────────────────────────────────────────────────────────────
// 4. Underlying failures propagate untouched
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn operation_error_keeps_its_identity_and_skips_after_event() {
    let records = Records::default();
    let log = Arc::clone(&records.log);
    let records = Instrumented::new(records).unwrap();
    record_events(&records, &log, &["onBeginRename", "onAfterRename"]);

    let err = records.rename("r-1", "").await.unwrap_err();
    assert!(matches!(err, TestError::Rejected(ref id) if id == "r-1"));
    assert_eq!(event_names(&log), vec!["onBeginRename"]);
}

// ─────────────────────────────────────────────────────────────────────
// 5. Handler failures propagate to the caller
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_begin_handler_aborts_the_operation() {
    let records = Instrumented::new(Records::default()).unwrap();
    records
        .hooks()
        .unwrap()
        .register_fallible("onBeginCreate", |_| Err("audit unavailable"))
        .unwrap();

    let err = records.create("a".to_string()).await.unwrap_err();
    assert!(matches!(err, TestError::Instrument(InstrumentError::Hook(_))));
    assert_eq!(records.inner().executions(), 0);
}

#[tokio::test]
async fn failing_after_handler_turns_success_into_failure() {
    let records = Instrumented::new(Records::default()).unwrap();
    records
        .hooks()
        .unwrap()
        .register_fallible("onAfterCreate", |_| Err("audit unavailable"))
        .unwrap();

    let err = records.create("a".to_string()).await.unwrap_err();
    assert!(err.to_string().contains("audit unavailable"), "got: {err}");
    assert_eq!(records.inner().executions(), 1);
}

// ─────────────────────────────────────────────────────────────────────
// 6. Registry semantics through the wrapper
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn last_registration_wins() {
    let records = Instrumented::new(Records::default()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for label in ["first", "second"] {
        let seen = Arc::clone(&seen);
        records
            .hooks()
            .unwrap()
            .register("onBeginCreate", move |_| seen.lock().unwrap().push(label))
            .unwrap();
    }

    records.create("a".to_string()).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["second"]);
}

#[tokio::test]
async fn no_handlers_is_a_silent_noop() {
    let records = Instrumented::new(Records::default()).unwrap();
    let record = records.create("a".to_string()).await.unwrap();
    assert_eq!(record.id, "r-1");
    assert!(records.hooks().unwrap().is_empty());
}

#[tokio::test]
async fn registries_are_not_shared_between_instances() {
    let first = Instrumented::new(Records::default()).unwrap();
    let second = Instrumented::new(Records::default()).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = Arc::clone(&hits);

    first
        .hooks()
        .unwrap()
        .register("onBeginCreate", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    second.create("b".to_string()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    first.create("a".to_string()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────
// 7. Dynamic operations are skipped, not fatal
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generic_operation_is_forwarded_without_events() {
    let records = Records::default();
    let log = Arc::clone(&records.log);
    let records = Instrumented::new(records).unwrap();
    record_events(&records, &log, &["onBeginAnnotate", "onAfterAnnotate"]);

    assert_eq!(records.annotate(String::from("n")).await.unwrap(), "n");
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(records.plan().get("annotate"), Some(&PlannedOperation::Skipped));
}

#[test]
fn declarations_follow_method_order_and_naming() {
    let names: Vec<_> = Records::operation_set()
        .operations()
        .iter()
        .map(|decl| decl.name())
        .collect();
    assert_eq!(names, vec!["create", "rename", "count", "purge", "annotate"]);
}

// ─────────────────────────────────────────────────────────────────────
// 8. Exemption scoping across an extends chain
// ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Base {
    calls: AtomicUsize,
}

#[operations]
impl Base {
    #[exempt]
    async fn foo(&self) -> Result<u32, TestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }

    async fn bar(&self, n: u32) -> Result<u32, TestError> {
        Ok(n * 2)
    }
}

#[derive(Default)]
struct Derived {
    base: Base,
}

#[operations(extends = Base, via = base)]
impl Derived {
    async fn foo(&self) -> Result<u32, TestError> {
        Ok(2)
    }
}

#[tokio::test]
async fn override_of_exempt_operation_is_wrapped_unless_remarked() {
    let base = Instrumented::new(Base::default()).unwrap();
    let derived = Instrumented::new(Derived::default()).unwrap();
    let fired = Arc::new(Mutex::new(Vec::new()));

    for (label, hooks) in [("base", base.hooks()), ("derived", derived.hooks())] {
        let fired = Arc::clone(&fired);
        hooks
            .unwrap()
            .register("onBeginFoo", move |_| fired.lock().unwrap().push(label))
            .unwrap();
    }

    assert_eq!(base.foo().await.unwrap(), 1);
    assert_eq!(derived.foo().await.unwrap(), 2);
    assert_eq!(*fired.lock().unwrap(), vec!["derived"]);
}

#[tokio::test]
async fn inherited_operation_is_wrapped_on_the_derived_instance() {
    let derived = Instrumented::new(Derived::default()).unwrap();
    let after = Arc::new(Mutex::new(None));
    let after_clone = Arc::clone(&after);
    derived
        .hooks()
        .unwrap()
        .register("onAfterBar", move |value| {
            *after_clone.lock().unwrap() = Some(value.clone());
        })
        .unwrap();

    let value = derived.parent().bar(21).await.unwrap();

    assert_eq!(value, 42);
    assert_eq!(after.lock().unwrap().take(), Some(json!(42)));
    let names: Vec<_> = derived.plan().iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["foo", "bar"]);
}

#[tokio::test]
async fn parent_view_runs_the_parent_implementation() {
    let derived = Instrumented::new(Derived::default()).unwrap();
    let fired = Arc::new(Mutex::new(Vec::new()));
    let fired_clone = Arc::clone(&fired);
    derived
        .hooks()
        .unwrap()
        .register("onBeginFoo", move |_| fired_clone.lock().unwrap().push("foo"))
        .unwrap();

    // Base declares its own `foo` exempt, so reaching it through the view fires nothing.
    assert_eq!(derived.parent().foo().await.unwrap(), 1);
    assert_eq!(derived.inner().base.calls.load(Ordering::SeqCst), 1);
    assert!(fired.lock().unwrap().is_empty());

    assert_eq!(derived.foo().await.unwrap(), 2);
    assert_eq!(*fired.lock().unwrap(), vec!["foo"]);
}

#[derive(Default)]
struct Leaf {
    derived: Derived,
}

#[operations(extends = Derived, via = derived)]
impl Leaf {
    async fn baz(&self) -> Result<u32, TestError> {
        Ok(3)
    }
}

#[tokio::test]
async fn grandparent_operations_are_reachable_through_nested_views() {
    let leaf = Instrumented::new(Leaf::default()).unwrap();
    let after = Arc::new(Mutex::new(Vec::new()));
    for event in ["onAfterBar", "onAfterBaz"] {
        let after = Arc::clone(&after);
        leaf.hooks()
            .unwrap()
            .register(event, move |value| {
                after.lock().unwrap().push((event, value.clone()));
            })
            .unwrap();
    }

    assert_eq!(leaf.baz().await.unwrap(), 3);
    assert_eq!(leaf.parent().parent().bar(5).await.unwrap(), 10);
    assert_eq!(
        *after.lock().unwrap(),
        vec![("onAfterBaz", json!(3)), ("onAfterBar", json!(10))]
    );
}

#[tokio::test]
async fn parent_view_rejects_calls_on_a_detached_instance() {
    let leaf = Instrumented::detached(Leaf::default()).unwrap();
    let err = leaf.parent().parent().bar(1).await.unwrap_err();
    assert!(matches!(err, TestError::Instrument(ref e) if e.is_hooks_not_initialized()));
}

// ─────────────────────────────────────────────────────────────────────
// 8b. Same-named types across an extends chain
// ─────────────────────────────────────────────────────────────────────

mod v1 {
    use super::*;

    #[derive(Default)]
    pub struct Api;

    #[operations]
    impl Api {
        pub async fn ping(&self) -> Result<&'static str, TestError> {
            Ok("pong")
        }
    }
}

mod v2 {
    use super::*;

    #[derive(Default)]
    pub struct Api {
        pub v1: super::v1::Api,
    }

    #[operations(extends = super::v1::Api, via = v1)]
    impl Api {
        pub async fn status(&self) -> Result<u16, TestError> {
            Ok(200)
        }
    }
}

#[tokio::test]
async fn same_named_parent_keeps_its_operations() {
    use v1::ApiOperations as _;
    use v2::ApiOperations as _;

    let api = Instrumented::new(v2::Api::default()).unwrap();
    assert!(api.plan().declares("ping"));
    assert!(api.plan().is_wrapped("ping"));

    let begun = Arc::new(AtomicUsize::new(0));
    let begun_clone = Arc::clone(&begun);
    api.hooks()
        .unwrap()
        .register("onBeginPing", move |_| {
            begun_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert_eq!(api.status().await.unwrap(), 200);
    assert_eq!(api.parent().ping().await.unwrap(), "pong");
    assert_eq!(begun.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────
// 8c. Operation names derived from method names stay unique
// ─────────────────────────────────────────────────────────────────────

struct Underscored;

#[operations]
impl Underscored {
    async fn create_record(&self) -> Result<u8, TestError> {
        Ok(1)
    }

    async fn record_create(&self) -> Result<u8, TestError> {
        Ok(2)
    }
}

#[tokio::test]
async fn distinct_methods_own_distinct_event_pairs() {
    let instance = Instrumented::new(Underscored).unwrap();
    let wrapped: Vec<_> = instance
        .plan()
        .wrapped()
        .map(|(name, events)| (name, events.after.clone()))
        .collect();
    assert_eq!(
        wrapped,
        vec![
            ("createRecord", "onAfterCreateRecord".to_string()),
            ("recordCreate", "onAfterRecordCreate".to_string()),
        ]
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    for event in ["onAfterCreateRecord", "onAfterRecordCreate"] {
        let seen = Arc::clone(&seen);
        instance
            .hooks()
            .unwrap()
            .register(event, move |value| seen.lock().unwrap().push((event, value.clone())))
            .unwrap();
    }
    instance.create_record().await.unwrap();
    instance.record_create().await.unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("onAfterCreateRecord", json!(1)),
            ("onAfterRecordCreate", json!(2)),
        ]
    );
}

/// Declares `create` twice, as `create` and `_create` would.
#[derive(Debug)]
struct Duplicated;

impl Operations for Duplicated {
    fn operation_set() -> &'static OperationSet {
        static OPERATIONS: OperationSet = OperationSet::new(
            "Duplicated",
            &[OperationDecl::new("create"), OperationDecl::new("create")],
        );
        &OPERATIONS
    }
}

#[test]
fn duplicate_declarations_fail_construction() {
    let err = Instrumented::new(Duplicated).unwrap_err();
    assert!(
        matches!(err, InstrumentError::EventNameCollision { ref event, .. } if event == "onBeginCreate"),
        "got: {err}"
    );
}

// ─────────────────────────────────────────────────────────────────────
// 9. End-to-end scenario
// ─────────────────────────────────────────────────────────────────────

struct Contracts;

#[operations]
impl Contracts {
    async fn create(&self, name: String) -> Result<Record, TestError> {
        let _ = name;
        Ok(Record { id: "r-1".into() })
    }
}

#[tokio::test]
async fn create_contract_records_begin_and_after() {
    let contracts = Instrumented::new(Contracts).unwrap();
    let recorded = Arc::new(Mutex::new(Vec::<Vec<String>>::new()));
    let hooks = contracts.hooks().unwrap();

    let begin = Arc::clone(&recorded);
    hooks
        .register("onBeginCreate", move |args| {
            let name = args[0].as_str().unwrap_or_default().to_string();
            begin.lock().unwrap().push(vec!["create".into(), name]);
        })
        .unwrap();

    let after = Arc::clone(&recorded);
    hooks
        .register("onAfterCreate", move |value| {
            let id = value["id"].as_str().unwrap_or_default().to_string();
            after.lock().unwrap().push(vec!["created".into(), id]);
        })
        .unwrap();

    let result = contracts.create("contract-1".to_string()).await.unwrap();

    assert_eq!(result, Record { id: "r-1".into() });
    assert_eq!(
        *recorded.lock().unwrap(),
        vec![
            vec!["create".to_string(), "contract-1".to_string()],
            vec!["created".to_string(), "r-1".to_string()],
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// 10. Interleaved calls keep per-call ordering
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_calls_keep_begin_before_after() {
    let records = Records::default();
    let log = Arc::clone(&records.log);
    let records = Instrumented::new(records).unwrap();
    record_events(&records, &log, &["onBeginRename", "onAfterRename"]);

    let (a, b) = tokio::join!(records.rename("a", "x"), records.rename("b", "y"));
    assert_eq!(a.unwrap().id, "a");
    assert_eq!(b.unwrap().id, "b");

    let entries = log.lock().unwrap().clone();
    for id in ["a", "b"] {
        let begin = entries
            .iter()
            .position(|(name, payload)| name == "onBeginRename" && payload[0] == id)
            .expect("begin recorded");
        let after = entries
            .iter()
            .position(|(name, payload)| name == "onAfterRename" && payload["id"] == id)
            .expect("after recorded");
        assert!(begin < after);
    }
}
