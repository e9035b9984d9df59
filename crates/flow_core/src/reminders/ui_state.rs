use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shared::domain::{SiteId, Weekday};
use storage::ReminderSettings;

use super::{builders::UiBuilders, screen::Screen};

/// Reminder settings being edited in the sheet, not yet saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub site_id: SiteId,
    pub enabled_days: BTreeSet<Weekday>,
    pub hour: u8,
    pub minute: u8,
}

impl ReminderDraft {
    pub fn toggle_day(&mut self, day: Weekday) {
        if !self.enabled_days.remove(&day) {
            self.enabled_days.insert(day);
        }
    }

    pub fn formatted_time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    pub fn to_settings(&self) -> ReminderSettings {
        ReminderSettings {
            site_id: self.site_id,
            enabled_days: self.enabled_days.clone(),
            hour: self.hour,
            minute: self.minute,
        }
    }
}

impl From<ReminderSettings> for ReminderDraft {
    fn from(settings: ReminderSettings) -> Self {
        Self {
            site_id: settings.site_id,
            enabled_days: settings.enabled_days,
            hour: settings.hour,
            minute: settings.minute,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowFlags {
    pub is_first_time_flow: bool,
    pub is_time_picker_active: bool,
}

/// Everything the derived [`UiState`] is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowInputs {
    pub screen: Option<Screen>,
    pub draft: Option<ReminderDraft>,
    pub flags: FlowFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "day", rename_all = "snake_case")]
pub enum ItemAction {
    SelectDay(Weekday),
    SelectTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayButton {
    pub day: Weekday,
    pub label: String,
    pub selected: bool,
    pub action: ItemAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReminderItem {
    Illustration { name: String },
    Title { text: String },
    Text { text: String },
    Caption { text: String },
    DayButtons { days: Vec<DayButton> },
    TimeRow {
        label: String,
        time: String,
        action: ItemAction,
    },
    Tip { title: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum PrimaryAction {
    StartSelection { is_first_time_flow: bool },
    ShowEpilogue(Option<ReminderDraft>),
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryButton {
    pub label: String,
    pub enabled: bool,
    pub action: PrimaryAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub items: Vec<ReminderItem>,
    pub time_picker_visible: bool,
    pub primary_button: Option<PrimaryButton>,
}

/// Computes the sheet's UI state from its inputs. Pure: equal inputs give equal output.
pub fn derive_ui_state(inputs: &FlowInputs, builders: &UiBuilders) -> UiState {
    let Some(screen) = inputs.screen else {
        return UiState::default();
    };

    let draft = inputs.draft.as_ref();
    let is_first_time_flow = inputs.flags.is_first_time_flow;

    let items = match screen {
        Screen::Prologue => builders.prologue_items(),
        Screen::PrologueSettings => builders.prologue_settings_items(),
        Screen::Selection => builders.selection_items(draft),
        Screen::Epilogue => builders.epilogue_items(draft),
    };
    let primary_button = match screen {
        Screen::Prologue | Screen::PrologueSettings => {
            builders.prologue_button(is_first_time_flow)
        }
        Screen::Selection => builders.selection_button(draft, is_first_time_flow),
        Screen::Epilogue => builders.epilogue_button(),
    };

    UiState {
        items,
        time_picker_visible: inputs.flags.is_time_picker_active,
        primary_button: Some(primary_button),
    }
}
