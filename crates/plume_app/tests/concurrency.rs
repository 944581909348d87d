//! Concurrent dispatch tests for `plume_app`.
//!
//! These tests verify that concurrent calls get isolated contexts and that
//! hooks of one call run strictly in sequence.


use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use plume_app::hooks::{HookMap, async_hook, hook_fn};
use plume_service::Params;
use serde_json::{Value, json};
use test_utils::{HookLog, echo_app, memory_app};

/// Two concurrent calls never observe each other's mutations.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_have_isolated_contexts() {
    let (_app, echo, _) = echo_app();

    echo.hooks(
        HookMap::new()
            .before_all(async_hook(|ctx| {
                Box::pin(async move {
                    let tag = ctx.params.get("tag").cloned().unwrap_or(Value::Null);
                    // Yield so the other call interleaves between hooks.
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    ctx.data = Some(json!({ "tag": tag }));
                    Ok(None)
                })
            }))
            .after_all(hook_fn(|ctx| {
                let tag = ctx.params.get("tag").cloned();
                let seen = ctx.result.as_ref().and_then(|r| r.get("tag")).cloned();
                assert_eq!(tag, seen, "context leaked between calls");
                Ok(())
            })),
    )
    .unwrap();

    let call = |tag: &'static str| {
        let echo = echo.clone();
        async move {
            let mut params = Params::new();
            params.set("tag", json!(tag));
            echo.create(json!({}), params).await
        }
    };

    let (a, b) = tokio::join!(call("a"), call("b"));
    assert_eq!(a.unwrap(), json!({ "tag": "a" }));
    assert_eq!(b.unwrap(), json!({ "tag": "b" }));

    let tags = ["c", "d", "e", "f", "g", "h"];
    let results = join_all(tags.map(call)).await;
    for (tag, result) in tags.iter().zip(results) {
        assert_eq!(result.unwrap(), json!({ "tag": tag }));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_calls_all_complete() {
    let (app, messages) = memory_app();
    let mut events = app.subscribe();

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let messages = messages.clone();
            tokio::spawn(async move { messages.create(json!({ "n": n }), Params::new()).await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task panicked").expect("create failed");
    }

    let all = messages.find(Params::new()).await.unwrap();
    assert_eq!(all.as_array().map(Vec::len), Some(32));

    let mut received = 0;
    while events.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received, 32);
}

/// Hooks of one call never overlap, even when they suspend.
#[tokio::test]
async fn hooks_of_one_call_run_sequentially() {
    let (_app, echo, _) = echo_app();
    let active = Arc::new(AtomicUsize::new(0));
    let log = HookLog::new();

    let mut map = HookMap::new();
    for label in ["first", "second", "third"] {
        let active = Arc::clone(&active);
        let log = log.clone();
        map = map.before_all(async_hook(move |_ctx| {
            let active = Arc::clone(&active);
            let log = log.clone();
            Box::pin(async move {
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0, "hooks overlapped");
                tokio::task::yield_now().await;
                log.push(label);
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(None)
            })
        }));
    }
    echo.hooks(map).unwrap();

    echo.create(json!({}), Params::new()).await.unwrap();
    assert_eq!(log.entries(), ["first", "second", "third"]);
}

/// An abandoned call keeps the application usable for other calls.
#[tokio::test]
async fn dropped_call_does_not_poison_the_application() {
    let (_app, echo, _) = echo_app();

    echo.hooks(HookMap::new().before_all(async_hook(|ctx| {
        Box::pin(async move {
            if ctx.params.get("slow").is_some() {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(None)
        })
    })))
    .unwrap();

    let mut slow = Params::new();
    slow.set("slow", json!(true));
    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), echo.create(json!(1), slow)).await;
    assert!(abandoned.is_err());

    let result = echo.create(json!(2), Params::new()).await.unwrap();
    assert_eq!(result, json!(2));
}
