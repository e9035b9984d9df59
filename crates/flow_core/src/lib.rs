//! Controllers for the blogging reminders and prepublishing bottom sheets.
//!
//! Both controllers own their screen state, publish what the shell should render on
//! `tokio::sync::watch` channels, and hand navigation back to the shell as one-shot
//! events. Rendering is left to the caller.

pub mod analytics;
pub mod error;
pub mod event;
pub mod prepublishing;
pub mod reminders;

pub use analytics::{AnalyticsEvent, AnalyticsSink, TracingAnalytics};
pub use error::FlowError;
pub use event::{next_event, EventChannel, EventReceiver, OneShot};
pub use prepublishing::PrepublishingFlowController;
pub use reminders::{RemindersFlowConfig, RemindersFlowController};
