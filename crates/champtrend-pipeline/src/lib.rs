pub mod coordinator;
pub mod error;
pub mod notify;

pub use coordinator::Coordinator;
pub use error::PipelineError;
pub use notify::{
    notifier_from_config, notify_best_effort, render_message, NoopNotifier, Notifier, NotifyError,
    WebhookNotifier,
};
