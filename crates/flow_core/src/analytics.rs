//! Named analytics events emitted by the reminders flow.

use std::sync::{Arc, Mutex, PoisonError};

use shared::domain::SiteId;
use tracing::info;

use crate::reminders::{Screen, Source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    FlowStart { source: Source },
    ScreenShown { screen: Screen },
    PrimaryButtonPressed { screen: Screen },
    RemindersScheduled { days: usize },
    RemindersCancelled,
    FlowDismissed { screen: Screen },
    FlowCompleted,
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::FlowStart { .. } => "blogging_reminders_flow_start",
            AnalyticsEvent::ScreenShown { .. } => "blogging_reminders_screen_shown",
            AnalyticsEvent::PrimaryButtonPressed { .. } => "blogging_reminders_button_pressed",
            AnalyticsEvent::RemindersScheduled { .. } => "blogging_reminders_scheduled",
            AnalyticsEvent::RemindersCancelled => "blogging_reminders_cancelled",
            AnalyticsEvent::FlowDismissed { .. } => "blogging_reminders_flow_dismissed",
            AnalyticsEvent::FlowCompleted => "blogging_reminders_flow_completed",
        }
    }

    pub fn properties(&self) -> Vec<(&'static str, String)> {
        match self {
            AnalyticsEvent::FlowStart { source } => {
                vec![("source", source.tracking_name().to_string())]
            }
            AnalyticsEvent::ScreenShown { screen } | AnalyticsEvent::FlowDismissed { screen } => {
                vec![("screen", screen.tracking_name().to_string())]
            }
            AnalyticsEvent::PrimaryButtonPressed { screen } => vec![
                ("screen", screen.tracking_name().to_string()),
                ("button", "primary".to_string()),
            ],
            AnalyticsEvent::RemindersScheduled { days } => {
                vec![("days_of_week_count", days.to_string())]
            }
            AnalyticsEvent::RemindersCancelled | AnalyticsEvent::FlowCompleted => Vec::new(),
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn track(&self, site_id: Option<SiteId>, event: &AnalyticsEvent);
}

/// Writes every event to the `analytics` tracing target.
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&self, site_id: Option<SiteId>, event: &AnalyticsEvent) {
        let properties = event
            .properties()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        let site = site_id.map(|id| id.to_string()).unwrap_or_default();
        info!(target: "analytics", "{} site={site} {properties}", event.name());
    }
}

/// Remembers the site of the open flow and attaches it to each event.
pub struct RemindersAnalyticsTracker {
    sink: Arc<dyn AnalyticsSink>,
    site_id: Mutex<Option<SiteId>>,
}

impl RemindersAnalyticsTracker {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            sink,
            site_id: Mutex::new(None),
        }
    }

    pub fn set_site(&self, site_id: SiteId) {
        *self.site_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(site_id);
    }

    pub fn track_flow_start(&self, source: Source) {
        self.track(AnalyticsEvent::FlowStart { source });
    }

    pub fn track_screen_shown(&self, screen: Screen) {
        self.track(AnalyticsEvent::ScreenShown { screen });
    }

    pub fn track_primary_button_pressed(&self, screen: Screen) {
        self.track(AnalyticsEvent::PrimaryButtonPressed { screen });
    }

    pub fn track_reminders_scheduled(&self, days: usize) {
        self.track(AnalyticsEvent::RemindersScheduled { days });
    }

    pub fn track_reminders_cancelled(&self) {
        self.track(AnalyticsEvent::RemindersCancelled);
    }

    pub fn track_flow_dismissed(&self, screen: Screen) {
        self.track(AnalyticsEvent::FlowDismissed { screen });
    }

    pub fn track_flow_completed(&self) {
        self.track(AnalyticsEvent::FlowCompleted);
    }

    fn track(&self, event: AnalyticsEvent) {
        let site_id = *self.site_id.lock().unwrap_or_else(PoisonError::into_inner);
        self.sink.track(site_id, &event);
    }
}
