//! Orchestrator sequencing and failure-handling tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chassis::lifecycle::{App, AppConfig, LifecycleError};
use common::{EventLog, Probe};
use tokio_util::sync::CancellationToken;

fn app() -> App {
    App::new(AppConfig::default())
}

#[tokio::test]
async fn start_follows_registration_order() {
    let log = EventLog::new();
    let mut app = app();
    for name in ["a", "b", "c"] {
        app.register_component(Arc::new(Probe::new(name, &log)));
    }

    app.start(CancellationToken::new()).await.unwrap();
    assert_eq!(log.events(), ["a.start", "b.start", "c.start"]);
}

#[tokio::test]
async fn stop_reverses_registration_order() {
    let log = EventLog::new();
    let mut app = app();
    for name in ["a", "b", "c"] {
        app.register_component(Arc::new(Probe::new(name, &log)));
    }

    let ctx = CancellationToken::new();
    app.start(ctx.clone()).await.unwrap();
    app.stop(ctx).await.unwrap();

    assert_eq!(
        log.events(),
        ["a.start", "b.start", "c.start", "c.stop", "b.stop", "a.stop"]
    );
}

#[tokio::test]
async fn failed_start_rolls_back_started_components() {
    let log = EventLog::new();
    let mut app = app();
    app.register_component(Arc::new(Probe::new("a", &log)));
    app.register_component(Arc::new(Probe::new("b", &log).fail_start("boot failure")));
    app.register_component(Arc::new(Probe::new("c", &log)));

    let error = app.start(CancellationToken::new()).await.unwrap_err();
    match &error {
        LifecycleError::StartFailed { index, .. } => assert_eq!(*index, 1),
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("component 1 failed to start"));
    assert!(error.to_string().contains("boot failure"));

    // The failed component is never stopped; the one after it is never touched.
    assert_eq!(log.count("a.stop"), 1);
    assert_eq!(log.count("b.stop"), 0);
    assert!(!log.events().iter().any(|e| e.starts_with("c.")));
}

#[tokio::test]
async fn rollback_stop_errors_are_swallowed() {
    let log = EventLog::new();
    let mut app = app();
    app.register_component(Arc::new(Probe::new("a", &log).fail_stop("broken pipe")));
    app.register_component(Arc::new(Probe::new("b", &log).fail_start("boot failure")));

    // The rollback failure of "a" must not mask or halt anything.
    let error = app.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        error,
        LifecycleError::StartFailed { index: 1, .. }
    ));
    assert!(!error.to_string().contains("broken pipe"));
    assert_eq!(log.count("a.stop"), 1);
}

#[tokio::test]
async fn stop_attempts_every_component_and_returns_the_last_error() {
    let log = EventLog::new();
    let mut app = app();
    app.register_component(Arc::new(Probe::new("a", &log).fail_stop("a stop failed")));
    app.register_component(Arc::new(Probe::new("b", &log)));
    app.register_component(Arc::new(Probe::new("c", &log).fail_stop("c stop failed")));

    let ctx = CancellationToken::new();
    app.start(ctx.clone()).await.unwrap();
    let error = app.stop(ctx).await.unwrap_err();

    // Stop order is c, b, a: "a" fails last, so its error is returned.
    match &error {
        LifecycleError::StopFailed { index, .. } => assert_eq!(*index, 0),
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("a stop failed"));
    assert_eq!(
        log.events()[3..],
        ["c.stop".to_string(), "b.stop".to_string(), "a.stop".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_abandons_a_component_blocking_past_the_timeout() {
    let log = EventLog::new();
    let mut app = App::new(AppConfig {
        shutdown_timeout: Duration::from_millis(200),
    });
    app.register_component(Arc::new(
        Probe::new("slow", &log).slow_stop(Duration::from_secs(60)),
    ));

    let ctx = CancellationToken::new();
    app.start(ctx.clone()).await.unwrap();

    let before = tokio::time::Instant::now();
    let error = app.stop(ctx).await.unwrap_err();
    let elapsed = before.elapsed();

    assert!(matches!(error, LifecycleError::StopTimedOut { index: 0, .. }));
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(1), "stop waited {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn the_timeout_budget_spans_the_whole_sweep() {
    let log = EventLog::new();
    let mut app = App::new(AppConfig {
        shutdown_timeout: Duration::from_millis(200),
    });
    app.register_component(Arc::new(Probe::new("a", &log)));
    app.register_component(Arc::new(
        Probe::new("slow", &log).slow_stop(Duration::from_secs(60)),
    ));

    let ctx = CancellationToken::new();
    app.start(ctx.clone()).await.unwrap();
    let error = app.stop(ctx).await.unwrap_err();

    // "slow" (stopped first) eats the budget and times out; "a" is still
    // attempted afterwards with nothing left and completes instantly.
    assert!(matches!(error, LifecycleError::StopTimedOut { index: 1, .. }));
    assert_eq!(log.count("a.stop"), 1);
}

#[tokio::test]
async fn after_start_hooks_run_in_order_and_the_first_failure_is_fatal() {
    let log = EventLog::new();
    let mut app = app();
    app.register_component(Arc::new(Probe::new("a", &log)));

    let (h1, h2, h3) = (log.clone(), log.clone(), log.clone());
    app.after_start(move |_ctx| {
        let log = h1.clone();
        async move {
            log.push("hook.h1");
            Ok(())
        }
    })
    .after_start(move |_ctx| {
        let log = h2.clone();
        async move {
            log.push("hook.h2");
            Err("h2 exploded".into())
        }
    })
    .after_start(move |_ctx| {
        let log = h3.clone();
        async move {
            log.push("hook.h3");
            Ok(())
        }
    });

    let error = app.run().await.unwrap_err();
    match &error {
        LifecycleError::AfterStartHook { index, .. } => assert_eq!(*index, 1),
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("h2 exploded"));

    // H3 never ran, and no component was stopped in this path.
    assert_eq!(log.events(), ["a.start", "hook.h1", "hook.h2"]);
}

#[tokio::test]
async fn before_stop_hook_failures_do_not_block_shutdown() {
    let log = EventLog::new();
    let mut app = app();
    app.register_component(Arc::new(Probe::new("a", &log)));

    let (g1, g2, g3) = (log.clone(), log.clone(), log.clone());
    app.before_stop(move |_ctx| {
        let log = g1.clone();
        async move {
            log.push("hook.g1");
            Err("g1 exploded".into())
        }
    })
    .before_stop(move |_ctx| {
        let log = g2.clone();
        async move {
            log.push("hook.g2");
            Ok(())
        }
    })
    .before_stop(move |_ctx| {
        let log = g3.clone();
        async move {
            log.push("hook.g3");
            Ok(())
        }
    });

    let shutdown = app.shutdown_handle();
    let running = tokio::spawn(app.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("run did not finish")
        .unwrap();
    result.unwrap();

    assert_eq!(
        log.events(),
        ["a.start", "hook.g1", "hook.g2", "hook.g3", "a.stop"]
    );
}

#[tokio::test]
async fn an_empty_app_starts_and_stops_cleanly() {
    let app = app();
    let ctx = CancellationToken::new();
    app.start(ctx.clone()).await.unwrap();
    app.stop(ctx).await.unwrap();

    let app = App::new(AppConfig::default());
    let shutdown = app.shutdown_handle();
    let running = tokio::spawn(app.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.trigger();

    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("run did not finish")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn triggered_shutdown_tears_down_in_reverse_order() {
    let log = EventLog::new();
    let mut app = app();
    for name in ["db", "cache", "server"] {
        app.register_component(Arc::new(Probe::new(name, &log)));
    }

    let shutdown = app.shutdown_handle();
    let running = tokio::spawn(app.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("run did not finish")
        .unwrap();
    result.unwrap();

    assert_eq!(
        log.events(),
        [
            "db.start",
            "cache.start",
            "server.start",
            "server.stop",
            "cache.stop",
            "db.stop"
        ]
    );
}

#[tokio::test]
async fn startup_failure_scenario_reports_the_cause() {
    let log = EventLog::new();
    let mut app = app();
    app.register_component(Arc::new(Probe::new("db", &log)));
    app.register_component(Arc::new(
        Probe::new("cache", &log).fail_start("connection refused"),
    ));

    let error = app.run().await.unwrap_err();
    let message = error.to_string();
    assert!(message.contains('1'), "error should name index 1: {message}");
    assert!(message.contains("connection refused"));
    assert_eq!(log.count("db.stop"), 1);
}
