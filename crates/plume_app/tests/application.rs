//! Application registry tests.
//!
//! Tests covering service registration policies, event publishing, settings,
//! plugins and the setup/teardown lifecycle.


use async_trait::async_trait;
use plume_app::hooks::{HookMap, hook_fn};
use plume_app::{
    AppConfig, AppError, Application, DispatchError, DuplicatePathPolicy, Phase, Plugin,
    PluginGroup, PluginGroupBuilder, Scope, WrappedService,
};
use plume_service::{Id, Method, Params, Service, ServiceError};
use serde_json::{Value, json};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use test_utils::{EchoService, HookLog, MemoryService, echo_app, memory_app};
use tokio::sync::broadcast::error::TryRecvError;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRATION TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn duplicate_path_is_rejected_by_default() {
    let app = Application::new();
    app.use_service("users", MemoryService::default()).unwrap();

    let err = app
        .use_service("/users/", MemoryService::default())
        .unwrap_err();
    assert_eq!(err, AppError::DuplicatePath("users".into()));
}

#[tokio::test]
async fn replace_policy_swaps_service_and_drops_its_hooks() {
    let app = Application::with_config(
        AppConfig::new().with_duplicate_paths(DuplicatePathPolicy::Replace),
    );
    let log = HookLog::new();

    app.use_service("svc", MemoryService::default())
        .unwrap()
        .hooks(HookMap::new().before_all(log.hook("old-service-hook")))
        .unwrap();
    app.hooks(HookMap::new().before_all(log.hook("app-hook")))
        .unwrap();

    let replacement = app.use_service("svc", EchoService::default()).unwrap();
    assert_eq!(
        app.hook_registry()
            .hook_count(&Scope::service("svc"), Phase::Before),
        0
    );

    let result = replacement
        .create(json!({ "echo": true }), Params::new())
        .await
        .unwrap();
    assert_eq!(result, json!({ "echo": true }));
    assert_eq!(log.entries(), ["app-hook"]);
}

#[tokio::test]
async fn handle_stops_working_after_unuse() {
    let (app, echo, calls) = echo_app();
    app.unuse("echo").unwrap();

    let err = echo
        .create(json!({ "x": 1 }), Params::new())
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::from(AppError::ServiceNotFound("echo".into())));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let err = echo
        .hooks(HookMap::new().before_all(hook_fn(|_| Err(ServiceError::forbidden("stale")))))
        .unwrap_err();
    assert_eq!(err, AppError::ServiceNotFound("echo".into()));

    let fresh = app.use_service("echo", EchoService::default()).unwrap();
    let result = fresh.create(json!({ "x": 2 }), Params::new()).await.unwrap();
    assert_eq!(result, json!({ "x": 2 }));
}

#[tokio::test]
async fn replaced_handle_cannot_attach_hooks_to_its_successor() {
    let app = Application::with_config(
        AppConfig::new().with_duplicate_paths(DuplicatePathPolicy::Replace),
    );
    let old = app.use_service("echo", EchoService::default()).unwrap();
    let new = app.use_service("echo", EchoService::default()).unwrap();

    let err = old
        .hooks(HookMap::new().before_all(hook_fn(|_| {
            Err(ServiceError::forbidden("from old handle"))
        })))
        .unwrap_err();
    assert_eq!(err, AppError::ServiceNotFound("echo".into()));
    assert_eq!(
        app.hook_registry()
            .hook_count(&Scope::service("echo"), Phase::Before),
        0
    );

    let err = old.create(json!({}), Params::new()).await.unwrap_err();
    assert_eq!(err, DispatchError::from(AppError::ServiceNotFound("echo".into())));

    let result = app
        .dispatch("echo", Method::Create, None, Some(json!({ "ok": true })), Params::new())
        .await
        .unwrap();
    assert_eq!(result, json!({ "ok": true }));
    new.create(json!({}), Params::new()).await.unwrap();
}

#[test]
fn unknown_service_is_not_found() {
    let app = Application::new();
    let err = app.service("missing").unwrap_err();
    assert_eq!(err, AppError::ServiceNotFound("missing".into()));
}

#[test]
fn service_hooks_must_name_exposed_methods() {
    let (_app, echo, _) = echo_app();

    let err = echo
        .hooks(HookMap::new().before(Method::Patch, hook_fn(|_| Ok(()))))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidHook { .. }));
    assert!(err.to_string().contains("patch"));
}

#[test]
fn hook_map_with_unknown_phase_name_is_rejected() {
    let err = HookMap::new()
        .try_on("finally", Method::Find, hook_fn(|_| Ok(())))
        .err();
    assert_eq!(err, Some(AppError::InvalidPhase("finally".into())));
}

#[tokio::test]
async fn registering_a_wrapped_service_does_not_wrap_twice() {
    let app = Application::new();
    let log = HookLog::new();
    app.hooks(HookMap::new().before_all(log.hook("once")))
        .unwrap();

    let wrapped = WrappedService::wrap(Arc::new(EchoService::default()));
    let handle = app
        .use_arc("echo", Arc::clone(&wrapped) as Arc<dyn Service>)
        .unwrap();

    assert!(Arc::ptr_eq(handle.service(), &wrapped));
    assert!(!wrapped.inner().is::<WrappedService>());

    handle.create(json!({}), Params::new()).await.unwrap();
    assert_eq!(log.entries(), ["once"]);
}

#[test]
fn handles_expose_methods() {
    let (_app, echo, _) = echo_app();
    let methods = echo.methods();

    assert!(methods.contains(&Method::Create));
    assert!(methods.contains(&Method::custom("shout")));
    assert!(!methods.contains(&Method::Update));
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn mutating_methods_publish_events() {
    let (app, messages) = memory_app();
    let mut events = app.subscribe();

    messages
        .create(json!({ "text": "hi" }), Params::new())
        .await
        .unwrap();
    messages
        .patch(Some(Id::from(1)), json!({ "text": "hey" }), Params::new())
        .await
        .unwrap();
    messages.find(Params::new()).await.unwrap();
    messages
        .remove(Some(Id::from(1)), Params::new())
        .await
        .unwrap();

    let created = events.recv().await.unwrap();
    assert_eq!(created.event, "created");
    assert_eq!(created.path, "messages");
    assert_eq!(created.data, json!({ "id": 1, "text": "hi" }));

    let patched = events.recv().await.unwrap();
    assert_eq!(patched.event, "patched");
    assert_eq!(patched.id, Some(Id::from(1)));

    let removed = events.recv().await.unwrap();
    assert_eq!(removed.event, "removed");
    assert_eq!(removed.method, Method::Remove);

    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn array_results_publish_one_event_per_element() {
    let (app, messages) = memory_app();
    let mut events = app.subscribe();

    messages
        .create(json!([{ "n": 1 }, { "n": 2 }]), Params::new())
        .await
        .unwrap();

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert_eq!(first.data["n"], json!(1));
    assert_eq!(second.data["n"], json!(2));
    assert_eq!(app.events().emit_count(), 2);
}

#[tokio::test]
async fn failed_calls_publish_nothing() {
    let (app, echo, _) = echo_app();
    let mut events = app.subscribe();

    echo.remove(None, Params::new()).await.unwrap_err();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn hooks_can_suppress_or_rename_events() {
    let (app, echo, _) = echo_app();
    let mut events = app.subscribe();

    echo.hooks(HookMap::new().after(
        Method::Create,
        hook_fn(|ctx| {
            let silent = ctx.params.get("silent").and_then(Value::as_bool) == Some(true);
            ctx.event = if silent { None } else { Some("echoed".into()) };
            Ok(())
        }),
    ))
    .unwrap();

    let mut silent = Params::new();
    silent.set("silent", json!(true));
    echo.create(json!(1), silent).await.unwrap();
    echo.create(json!(2), Params::new()).await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.event, "echoed");
    assert_eq!(event.data, json!(2));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn events_can_be_disabled() {
    let app = Application::with_config(AppConfig::new().with_events(false));
    let messages = app.use_service("messages", MemoryService::default()).unwrap();
    let mut events = app.subscribe();

    messages.create(json!({}), Params::new()).await.unwrap();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(app.events().emit_count(), 0);
}

#[tokio::test]
async fn calls_succeed_without_subscribers() {
    let (app, messages) = memory_app();
    assert_eq!(app.events().subscriber_count(), 0);

    let created = messages.create(json!({}), Params::new()).await;
    assert!(created.is_ok());
    assert_eq!(app.events().emit_count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn disabled_phases_skip_their_hooks() {
    let app = Application::with_config(AppConfig::new().disable_phase(Phase::After));
    let echo = app.use_service("echo", EchoService::default()).unwrap();
    let log = HookLog::new();

    echo.hooks(
        HookMap::new()
            .before_all(log.hook("before"))
            .after_all(log.hook("after")),
    )
    .unwrap();

    echo.create(json!({}), Params::new()).await.unwrap();
    assert_eq!(log.entries(), ["before"]);
}

#[test]
fn settings_seeded_from_config() {
    let config =
        AppConfig::from_json_str(r#"{ "settings": { "paginate": { "max": 50 } } }"#).unwrap();
    let app = Application::with_config(config);

    assert_eq!(app.get("paginate"), Some(json!({ "max": 50 })));
    assert_eq!(app.get("missing"), None);

    app.set("host", json!("localhost"));
    assert_eq!(app.settings().len(), 2);
}

#[tokio::test]
async fn hooks_read_settings_through_the_context() {
    let app = Application::with_config(AppConfig::new().with_setting("prefix", json!(">> ")));
    let echo = app.use_service("echo", EchoService::default()).unwrap();

    echo.hooks(HookMap::new().after_all(hook_fn(|ctx| {
        let prefix = ctx.app().get("prefix");
        let text = ctx.result.as_ref().and_then(Value::as_str).unwrap_or_default();
        let prefixed = format!("{}{text}", prefix.as_ref().and_then(Value::as_str).unwrap_or(""));
        ctx.result = Some(json!(prefixed));
        Ok(())
    })))
    .unwrap();

    let result = echo.create(json!("hello"), Params::new()).await.unwrap();
    assert_eq!(result, json!(">> hello"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN AND LIFECYCLE TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Records lifecycle calls into a shared log.
#[derive(Clone, Default)]
struct Lifecycle {
    log: Arc<Mutex<Vec<String>>>,
}

impl Lifecycle {
    fn push(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

struct TrackedService {
    name: &'static str,
    lifecycle: Lifecycle,
}

#[async_trait]
impl Service for TrackedService {
    fn methods(&self) -> Vec<Method> {
        Vec::new()
    }

    async fn setup(&self, path: &str) -> Result<(), ServiceError> {
        self.lifecycle.push(format!("setup {} at {path}", self.name));
        Ok(())
    }

    async fn teardown(&self, _path: &str) -> Result<(), ServiceError> {
        self.lifecycle.push(format!("teardown {}", self.name));
        Ok(())
    }
}

struct RegistersService {
    lifecycle: Lifecycle,
}

impl Plugin for RegistersService {
    fn build(&self, app: &Application) -> Result<(), AppError> {
        self.lifecycle.push("build plugin");
        app.use_service(
            "plugin-service",
            TrackedService {
                name: "plugin-service",
                lifecycle: self.lifecycle.clone(),
            },
        )?;
        Ok(())
    }

    fn ready(&self, _app: &Application) -> Result<(), AppError> {
        self.lifecycle.push("ready plugin");
        Ok(())
    }

    fn cleanup(&self, _app: &Application) {
        self.lifecycle.push("cleanup plugin");
    }
}

#[tokio::test]
async fn lifecycle_runs_in_order() {
    let app = Application::new();
    let lifecycle = Lifecycle::default();

    app.use_service(
        "first",
        TrackedService {
            name: "first",
            lifecycle: lifecycle.clone(),
        },
    )
    .unwrap();
    app.configure(RegistersService {
        lifecycle: lifecycle.clone(),
    })
    .unwrap();

    app.setup().await.unwrap();
    app.teardown().await.unwrap();

    assert_eq!(
        lifecycle.entries(),
        [
            "build plugin",
            "ready plugin",
            "setup first at first",
            "setup plugin-service at plugin-service",
            "teardown plugin-service",
            "teardown first",
            "cleanup plugin",
        ]
    );
}

#[tokio::test]
async fn setup_again_only_sets_up_new_services() {
    let app = Application::new();
    let lifecycle = Lifecycle::default();

    app.configure(RegistersService {
        lifecycle: lifecycle.clone(),
    })
    .unwrap();
    app.setup().await.unwrap();

    app.use_service(
        "late",
        TrackedService {
            name: "late",
            lifecycle: lifecycle.clone(),
        },
    )
    .unwrap();
    app.setup().await.unwrap();

    assert_eq!(
        lifecycle.entries(),
        [
            "build plugin",
            "ready plugin",
            "setup plugin-service at plugin-service",
            "setup late at late",
        ]
    );
}

struct Flaky {
    fail: Arc<Mutex<bool>>,
}

#[async_trait]
impl Service for Flaky {
    fn methods(&self) -> Vec<Method> {
        Vec::new()
    }

    async fn setup(&self, _path: &str) -> Result<(), ServiceError> {
        if *self.fail.lock().unwrap() {
            Err(ServiceError::unavailable("not yet"))
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn failed_setup_can_be_retried() {
    let app = Application::new();
    let fail = Arc::new(Mutex::new(true));
    app.use_service(
        "flaky",
        Flaky {
            fail: Arc::clone(&fail),
        },
    )
    .unwrap();

    let err = app.setup().await.unwrap_err();
    assert!(matches!(err, AppError::Lifecycle { stage: "setup", .. }));

    *fail.lock().unwrap() = false;
    app.setup().await.unwrap();
}

struct FailsToReady {
    fail: Arc<Mutex<bool>>,
    lifecycle: Lifecycle,
}

impl Plugin for FailsToReady {
    fn build(&self, _app: &Application) -> Result<(), AppError> {
        Ok(())
    }

    fn ready(&self, _app: &Application) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::plugin("FailsToReady", "boom"));
        }
        self.lifecycle.push("ready flaky");
        Ok(())
    }
}

struct CountsReady {
    lifecycle: Lifecycle,
}

impl Plugin for CountsReady {
    fn build(&self, _app: &Application) -> Result<(), AppError> {
        Ok(())
    }

    fn ready(&self, _app: &Application) -> Result<(), AppError> {
        self.lifecycle.push("ready counter");
        Ok(())
    }
}

#[tokio::test]
async fn failed_plugin_ready_is_retried_with_later_plugins() {
    let app = Application::new();
    let lifecycle = Lifecycle::default();
    let fail = Arc::new(Mutex::new(true));

    app.configure(FailsToReady {
        fail: Arc::clone(&fail),
        lifecycle: lifecycle.clone(),
    })
    .unwrap();
    app.configure(CountsReady {
        lifecycle: lifecycle.clone(),
    })
    .unwrap();

    let err = app.setup().await.unwrap_err();
    assert_eq!(err.to_string(), "plugin 'FailsToReady' failed: boom");
    assert!(lifecycle.entries().is_empty());

    // Still failing: the next setup reports it again instead of succeeding.
    assert!(app.setup().await.is_err());
    assert!(lifecycle.entries().is_empty());

    *fail.lock().unwrap() = false;
    app.setup().await.unwrap();
    app.setup().await.unwrap();
    assert_eq!(lifecycle.entries(), ["ready flaky", "ready counter"]);
}

#[tokio::test]
async fn plugins_added_after_setup_are_readied_next_time() {
    let app = Application::new();
    let lifecycle = Lifecycle::default();

    app.configure(RegistersService {
        lifecycle: lifecycle.clone(),
    })
    .unwrap();
    app.setup().await.unwrap();

    app.configure(CountsReady {
        lifecycle: lifecycle.clone(),
    })
    .unwrap();
    app.setup().await.unwrap();

    assert_eq!(
        lifecycle.entries(),
        [
            "build plugin",
            "ready plugin",
            "setup plugin-service at plugin-service",
            "ready counter",
        ]
    );
}

struct Pagination;

impl Plugin for Pagination {
    fn build(&self, app: &Application) -> Result<(), AppError> {
        app.set("paginate", json!({ "default": 10 }));
        Ok(())
    }
}

struct Audit {
    log: HookLog,
}

impl Plugin for Audit {
    fn build(&self, app: &Application) -> Result<(), AppError> {
        app.hooks(HookMap::new().after_all(self.log.hook("audit")))?;
        Ok(())
    }
}

struct Everything {
    log: HookLog,
}

impl PluginGroup for Everything {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(Pagination)
            .add(Audit { log: self.log })
    }
}

#[tokio::test]
async fn plugin_groups_configure_in_order() {
    let (app, echo, _) = echo_app();
    let log = HookLog::new();

    app.configure(Everything { log: log.clone() }.build())
        .unwrap();

    assert!(app.has_plugin::<Pagination>());
    assert!(app.has_plugin::<Audit>());
    assert_eq!(app.get("paginate"), Some(json!({ "default": 10 })));

    echo.create(json!({}), Params::new()).await.unwrap();
    assert_eq!(log.entries(), ["audit"]);
}

#[test]
fn disabled_group_members_are_skipped() {
    let app = Application::new();
    let group = Everything {
        log: HookLog::new(),
    }
    .build()
    .disable::<Audit>();

    app.configure(group).unwrap();
    assert!(app.has_plugin::<Pagination>());
    assert!(!app.has_plugin::<Audit>());
}

struct Broken;

impl Plugin for Broken {
    fn build(&self, _app: &Application) -> Result<(), AppError> {
        Err(AppError::plugin("Broken", "missing credentials"))
    }
}

#[test]
fn failed_plugin_build_is_reported_and_not_recorded() {
    let app = Application::new();

    let err = app.configure(Broken).unwrap_err();
    assert_eq!(err.to_string(), "plugin 'Broken' failed: missing credentials");
    assert!(!app.has_plugin::<Broken>());
}
