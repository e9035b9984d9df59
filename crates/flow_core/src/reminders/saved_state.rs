//! Bundle layout for the reminders flow.

use shared::{
    bundle::Bundle,
    domain::{SiteId, Weekday},
};
use tracing::warn;

use super::{screen::Screen, ui_state::ReminderDraft};

pub const KEY_SHOWN_SCREEN: &str = "shown_screen";
pub const KEY_SITE_ID: &str = "site_id";
pub const KEY_SELECTED_DAYS: &str = "selected_days";
pub const KEY_SELECTED_HOUR: &str = "selected_hour";
pub const KEY_SELECTED_MINUTE: &str = "selected_minute";
pub const KEY_IS_FIRST_TIME_FLOW: &str = "is_first_time_flow";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedFlowState {
    pub screen: Option<Screen>,
    pub draft: Option<ReminderDraft>,
    pub is_first_time_flow: bool,
}

impl SavedFlowState {
    pub fn write_to(&self, bundle: &mut Bundle) {
        if let Some(screen) = self.screen {
            bundle.put_string(KEY_SHOWN_SCREEN, screen.name());
        }
        if let Some(draft) = &self.draft {
            bundle.put_int(KEY_SITE_ID, draft.site_id.0);
            bundle.put_string_list(
                KEY_SELECTED_DAYS,
                draft
                    .enabled_days
                    .iter()
                    .map(|day| day.name().to_string())
                    .collect(),
            );
            bundle.put_int(KEY_SELECTED_HOUR, i64::from(draft.hour));
            bundle.put_int(KEY_SELECTED_MINUTE, i64::from(draft.minute));
        }
        bundle.put_bool(KEY_IS_FIRST_TIME_FLOW, self.is_first_time_flow);
    }

    /// Missing keys leave the matching field unset. A site id of 0 means no draft was saved.
    pub fn read_from(bundle: &Bundle) -> Self {
        let screen = bundle.get_string(KEY_SHOWN_SCREEN).and_then(|name| {
            let screen = Screen::from_name(name);
            if screen.is_none() {
                warn!("reminders: ignoring unknown saved screen '{name}'");
            }
            screen
        });

        let draft = match bundle.get_int(KEY_SITE_ID) {
            Some(site_id) if site_id != 0 => Some(ReminderDraft {
                site_id: SiteId(site_id),
                enabled_days: bundle
                    .get_string_list(KEY_SELECTED_DAYS)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|name| {
                        let day = Weekday::from_name(name);
                        if day.is_none() {
                            warn!("reminders: ignoring unknown saved weekday '{name}'");
                        }
                        day
                    })
                    .collect(),
                hour: read_bounded(bundle, KEY_SELECTED_HOUR, 23),
                minute: read_bounded(bundle, KEY_SELECTED_MINUTE, 59),
            }),
            _ => None,
        };

        Self {
            screen,
            draft,
            is_first_time_flow: bundle.get_bool(KEY_IS_FIRST_TIME_FLOW).unwrap_or(false),
        }
    }
}

fn read_bounded(bundle: &Bundle, key: &str, max: u8) -> u8 {
    let raw = bundle.get_int(key).unwrap_or(0);
    match u8::try_from(raw) {
        Ok(value) if value <= max => value,
        _ => {
            warn!("reminders: saved {key}={raw} out of range, using 0");
            0
        }
    }
}
