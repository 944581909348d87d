//! Example message board CLI.
//!
//! Drives the `messages` service through the same dispatch entry point a
//! transport adapter would use, and logs the events it publishes.
//!
//! # Usage
//!
//! ```bash
//! messages [page_size]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=debug messages 5
//! ```

use example::{MESSAGES_PATH, MessagesPlugin};
use plume_app::{Application, DispatchError, PluginGroup};
use plume_core_plugins::DefaultPlugins;
use plume_service::{Id, Method, Params};
use serde_json::{Value, json};

#[tokio::main]
async fn main() {
    let page_size = match std::env::args().nth(1).map(|arg| arg.parse::<u64>()) {
        None => MessagesPlugin::default().page_size,
        Some(Ok(size)) => size,
        Some(Err(e)) => {
            eprintln!("Error: page size must be a number: {e}");
            std::process::exit(1);
        }
    };

    let app = Application::new();
    let configured = app
        .configure(DefaultPlugins.build())
        .and_then(|app| app.configure(MessagesPlugin { page_size }));
    if let Err(e) = configured {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = app.setup().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut events = app.subscribe();
    let user = json!({ "name": "ada" });
    let rest = || Params::new().with_provider("rest");

    report(
        "create",
        app.dispatch(
            MESSAGES_PATH,
            Method::Create,
            None,
            Some(json!({ "text": "  hello plume  " })),
            rest().with_user(user.clone()),
        )
        .await,
    );

    report(
        "create batch",
        app.dispatch(
            MESSAGES_PATH,
            Method::Create,
            None,
            Some(json!([{ "text": "second" }, { "text": "third" }])),
            rest().with_user(user.clone()),
        )
        .await,
    );

    report(
        "create blank",
        app.dispatch(
            MESSAGES_PATH,
            Method::Create,
            None,
            Some(json!({ "text": "   " })),
            rest(),
        )
        .await,
    );

    report(
        "find",
        app.dispatch(MESSAGES_PATH, Method::Find, None, None, rest())
            .await,
    );

    report(
        "remove anonymously",
        app.dispatch(MESSAGES_PATH, Method::Remove, Some(Id::from(1)), None, rest())
            .await,
    );

    report(
        "remove as ada",
        app.dispatch(
            MESSAGES_PATH,
            Method::Remove,
            Some(Id::from(1)),
            None,
            rest().with_user(user),
        )
        .await,
    );

    report(
        "unknown service",
        app.dispatch("users", Method::Find, None, None, rest()).await,
    );

    while let Ok(event) = events.try_recv() {
        tracing::info!(
            path = %event.path,
            event = %event.event,
            data = %event.data,
            "service event"
        );
    }

    if let Err(e) = app.teardown().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn report(label: &str, outcome: Result<Value, DispatchError>) {
    match outcome {
        Ok(result) => tracing::info!(%result, "{label}"),
        Err(e) => {
            let error = e.into_service_error().to_json();
            tracing::warn!(%error, "{label} failed");
        }
    }
}
