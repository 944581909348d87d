//! Hooks used by the messages service.

use plume_app::HookContext;
use plume_app::hooks::{Hook, async_hook, hook_fn};
use plume_service::ServiceError;
use serde_json::{Value, json};

/// Longest accepted message body, in characters.
pub const MAX_TEXT_LEN: usize = 400;

fn check_text(record: &mut Value) -> Result<(), ServiceError> {
    let invalid = |reason: &str| {
        ServiceError::bad_request(format!("message text {reason}"))
            .with_data(json!({ "field": "text" }))
    };

    let Some(text) = record.get("text").and_then(Value::as_str) else {
        return Err(invalid("is required"));
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid("must not be blank"));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(invalid("is too long"));
    }

    let trimmed = trimmed.to_owned();
    record["text"] = Value::String(trimmed);
    Ok(())
}

/// Trims `data.text` and rejects blank or oversized bodies.
///
/// Batch creates are validated element by element.
pub fn validate_text() -> impl Hook {
    hook_fn(|ctx| match ctx.data.as_mut() {
        Some(Value::Array(batch)) => batch.iter_mut().try_for_each(check_text),
        Some(record) => check_text(record),
        None => Err(ServiceError::bad_request("message data is required")),
    })
    .named("validate_text")
}

/// Stamps `data.userId` with the authenticated user's name.
pub fn attach_user() -> impl Hook {
    hook_fn(|ctx| {
        let Some(name) = ctx
            .params
            .user
            .as_ref()
            .and_then(|user| user.get("name"))
            .cloned()
        else {
            return Ok(());
        };

        match ctx.data.as_mut() {
            Some(Value::Array(batch)) => batch
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .for_each(|record| {
                    record.insert("userId".into(), name.clone());
                }),
            Some(Value::Object(record)) => {
                record.insert("userId".into(), name);
            }
            _ => {}
        }
        Ok(())
    })
    .named("attach_user")
}

/// Rejects external calls without an authenticated user.
///
/// Calls made from inside the process (no `provider`) are trusted.
pub fn require_user() -> impl Hook {
    hook_fn(|ctx| {
        if ctx.params.is_internal() || ctx.params.user.is_some() {
            return Ok(());
        }
        ctx.status_code = Some(401);
        Err(ServiceError::not_authenticated(format!(
            "'{}' on '{}' requires a user",
            ctx.method(),
            ctx.path()
        )))
    })
    .named("require_user")
}

/// Applies the `paginate.default` setting to `find` calls without `$limit`.
pub fn paginate() -> impl Hook {
    async_hook(|ctx: &mut HookContext| {
        Box::pin(async move {
            if ctx.params.query.contains_key("$limit") {
                return Ok(None);
            }
            let default = ctx
                .app()
                .get("paginate")
                .and_then(|paginate| paginate.get("default").and_then(Value::as_u64));

            if let (Some(default), Some(Value::Array(items))) = (default, ctx.result.as_mut()) {
                items.truncate(usize::try_from(default).unwrap_or(usize::MAX));
            }
            Ok(None)
        })
    })
    .named("paginate")
}

/// Logs every failed call at `warn` level.
pub fn log_errors() -> impl Hook {
    hook_fn(|ctx| {
        if let Some(error) = &ctx.error {
            tracing::warn!(
                path = ctx.path(),
                method = %ctx.method(),
                code = error.code(),
                "{}",
                error.message()
            );
        }
        Ok(())
    })
    .named("log_errors")
}
