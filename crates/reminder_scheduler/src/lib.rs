use std::{
    collections::{BTreeSet, HashMap},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use shared::domain::{SiteId, Weekday};
use tokio::sync::broadcast;
use tracing::info;

/// Fires on each enabled day at `hour:minute` local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyReminder {
    pub days: BTreeSet<Weekday>,
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    Scheduled {
        site_id: SiteId,
        reminder: WeeklyReminder,
    },
    Cancelled {
        site_id: SiteId,
    },
}

pub trait ReminderScheduler: Send + Sync {
    /// Replaces any reminder already scheduled for `site_id`.
    fn schedule(&self, site_id: SiteId, reminder: WeeklyReminder) -> anyhow::Result<()>;
    fn cancel_by_site_id(&self, site_id: SiteId) -> anyhow::Result<()>;
}

/// Keeps the active reminders in process and announces every change.
pub struct InMemoryReminderScheduler {
    active: Mutex<HashMap<SiteId, WeeklyReminder>>,
    events: broadcast::Sender<SchedulerEvent>,
}

impl Default for InMemoryReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReminderScheduler {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            active: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn scheduled_for(&self, site_id: SiteId) -> Option<WeeklyReminder> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&site_id)
            .cloned()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }
}

impl ReminderScheduler for InMemoryReminderScheduler {
    fn schedule(&self, site_id: SiteId, reminder: WeeklyReminder) -> anyhow::Result<()> {
        if reminder.days.is_empty() {
            anyhow::bail!("weekly reminder for site {site_id} has no days");
        }
        if reminder.hour > 23 || reminder.minute > 59 {
            anyhow::bail!(
                "weekly reminder for site {site_id} has invalid time {:02}:{:02}",
                reminder.hour,
                reminder.minute
            );
        }

        info!(
            "scheduler: scheduled site={site_id} days={} at={:02}:{:02}",
            reminder.days.len(),
            reminder.hour,
            reminder.minute
        );
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(site_id, reminder.clone());
        // No subscribers is fine.
        let _ = self
            .events
            .send(SchedulerEvent::Scheduled { site_id, reminder });
        Ok(())
    }

    fn cancel_by_site_id(&self, site_id: SiteId) -> anyhow::Result<()> {
        let removed = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&site_id);
        info!(
            "scheduler: cancelled site={site_id} had_reminder={}",
            removed.is_some()
        );
        let _ = self.events.send(SchedulerEvent::Cancelled { site_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly(days: &[Weekday], hour: u8, minute: u8) -> WeeklyReminder {
        WeeklyReminder {
            days: days.iter().copied().collect(),
            hour,
            minute,
        }
    }

    #[test]
    fn schedule_replaces_previous_reminder() {
        let scheduler = InMemoryReminderScheduler::new();
        scheduler
            .schedule(SiteId(1), weekly(&[Weekday::Monday], 9, 0))
            .expect("schedule");
        scheduler
            .schedule(SiteId(1), weekly(&[Weekday::Tuesday, Weekday::Friday], 18, 45))
            .expect("reschedule");

        assert_eq!(
            scheduler.scheduled_for(SiteId(1)),
            Some(weekly(&[Weekday::Tuesday, Weekday::Friday], 18, 45))
        );
    }

    #[test]
    fn cancel_removes_reminder_and_announces() {
        let scheduler = InMemoryReminderScheduler::new();
        let mut events = scheduler.subscribe_events();
        scheduler
            .schedule(SiteId(4), weekly(&[Weekday::Sunday], 7, 30))
            .expect("schedule");
        scheduler.cancel_by_site_id(SiteId(4)).expect("cancel");

        assert_eq!(scheduler.scheduled_for(SiteId(4)), None);
        assert!(matches!(
            events.try_recv(),
            Ok(SchedulerEvent::Scheduled { site_id: SiteId(4), .. })
        ));
        assert_eq!(
            events.try_recv().expect("cancel event"),
            SchedulerEvent::Cancelled { site_id: SiteId(4) }
        );
    }

    #[test]
    fn rejects_empty_or_invalid_reminders() {
        let scheduler = InMemoryReminderScheduler::new();
        assert!(scheduler.schedule(SiteId(1), weekly(&[], 9, 0)).is_err());
        assert!(scheduler
            .schedule(SiteId(1), weekly(&[Weekday::Monday], 9, 60))
            .is_err());
        assert_eq!(scheduler.scheduled_for(SiteId(1)), None);
    }

    #[test]
    fn weekly_reminder_serializes_day_names() {
        let raw = serde_json::to_string(&weekly(&[Weekday::Friday, Weekday::Monday], 8, 5))
            .expect("encode");
        assert_eq!(raw, r#"{"days":["MONDAY","FRIDAY"],"hour":8,"minute":5}"#);
    }
}
