//! Example message board built with Plume.
//!
//! Mounts an in-memory [`MessageService`] at `messages` and wraps it in hooks
//! that validate input, attach the author, guard destructive calls and
//! paginate listings.
//!
//! # Hook layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  app        before: ·                     error: log_errors  │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  messages  before create: validate_text, attach_user   │  │
//! │  │            before patch:  validate_text                │  │
//! │  │            before remove, clear: require_user          │  │
//! │  │            after find:    paginate                     │  │
//! │  │  ┌──────────────────────────────────────────────────┐  │  │
//! │  │  │  MessageService                                  │  │  │
//! │  │  └──────────────────────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod hooks;
mod service;

pub use service::{Message, MessageService};

use plume_app::hooks::HookMap;
use plume_app::{AppError, Application, Plugin};
use plume_service::Method;
use serde_json::json;

/// Path the messages service is mounted at.
pub const MESSAGES_PATH: &str = "messages";

/// Registers the messages service and its hooks.
#[derive(Debug, Clone)]
pub struct MessagesPlugin {
    /// Page size applied to `find` calls without `$limit`.
    pub page_size: u64,
}

impl Default for MessagesPlugin {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Plugin for MessagesPlugin {
    fn build(&self, app: &Application) -> Result<(), AppError> {
        app.set("paginate", json!({ "default": self.page_size }));

        app.use_service(MESSAGES_PATH, MessageService::default())?
            .hooks(
                HookMap::new()
                    .before(Method::Create, hooks::validate_text())
                    .before(Method::Create, hooks::attach_user())
                    .before(Method::Patch, hooks::validate_text())
                    .before(Method::Remove, hooks::require_user())
                    .before(MessageService::CLEAR, hooks::require_user())
                    .after(Method::Find, hooks::paginate()),
            )?;

        app.hooks(HookMap::new().error_all(hooks::log_errors()))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "MessagesPlugin"
    }
}
