//! Item and primary button builders for each reminders screen.

use std::{collections::BTreeSet, sync::Arc};

use shared::domain::Weekday;

use super::ui_state::{
    DayButton, ItemAction, PrimaryAction, PrimaryButton, ReminderDraft, ReminderItem,
};

/// Decides whether the prologue's primary button can be pressed.
pub trait PrologueButtonPolicy: Send + Sync {
    fn is_enabled(&self, is_first_time_flow: bool) -> bool;
}

/// Decides whether the day selection's primary button can be pressed.
pub trait SelectionButtonPolicy: Send + Sync {
    fn is_enabled(&self, draft: Option<&ReminderDraft>, is_first_time_flow: bool) -> bool;
}

pub struct AlwaysEnabled;

impl PrologueButtonPolicy for AlwaysEnabled {
    fn is_enabled(&self, _is_first_time_flow: bool) -> bool {
        true
    }
}

/// Enabled once at least one day is picked.
pub struct RequireEnabledDays;

impl SelectionButtonPolicy for RequireEnabledDays {
    fn is_enabled(&self, draft: Option<&ReminderDraft>, _is_first_time_flow: bool) -> bool {
        draft.is_some_and(|draft| !draft.enabled_days.is_empty())
    }
}

/// Like [`RequireEnabledDays`], but a returning user may save an empty selection
/// to turn reminders off.
pub struct AllowClearingOutsideFirstTime;

impl SelectionButtonPolicy for AllowClearingOutsideFirstTime {
    fn is_enabled(&self, draft: Option<&ReminderDraft>, is_first_time_flow: bool) -> bool {
        match draft {
            Some(draft) => !is_first_time_flow || !draft.enabled_days.is_empty(),
            None => false,
        }
    }
}

#[derive(Clone)]
pub struct UiBuilders {
    prologue_policy: Arc<dyn PrologueButtonPolicy>,
    selection_policy: Arc<dyn SelectionButtonPolicy>,
}

impl Default for UiBuilders {
    fn default() -> Self {
        Self {
            prologue_policy: Arc::new(AlwaysEnabled),
            selection_policy: Arc::new(RequireEnabledDays),
        }
    }
}

impl UiBuilders {
    pub fn with_prologue_policy(mut self, policy: Arc<dyn PrologueButtonPolicy>) -> Self {
        self.prologue_policy = policy;
        self
    }

    pub fn with_selection_policy(mut self, policy: Arc<dyn SelectionButtonPolicy>) -> Self {
        self.selection_policy = policy;
        self
    }

    pub fn prologue_items(&self) -> Vec<ReminderItem> {
        vec![
            ReminderItem::Illustration {
                name: "celebration".into(),
            },
            ReminderItem::Title {
                text: "Set your blogging goals".into(),
            },
            ReminderItem::Text {
                text: "Well done on your first post! Keep it going.".into(),
            },
            ReminderItem::Caption {
                text: "You can update this any time via My Site > Site Settings.".into(),
            },
        ]
    }

    pub fn prologue_settings_items(&self) -> Vec<ReminderItem> {
        vec![
            ReminderItem::Illustration {
                name: "celebration".into(),
            },
            ReminderItem::Title {
                text: "Set your blogging goals".into(),
            },
            ReminderItem::Text {
                text: "Get reminders to help you build a habit of publishing.".into(),
            },
            ReminderItem::Caption {
                text: "You can update this any time via My Site > Site Settings.".into(),
            },
        ]
    }

    pub fn selection_items(&self, draft: Option<&ReminderDraft>) -> Vec<ReminderItem> {
        let mut items = vec![
            ReminderItem::Illustration {
                name: "calendar".into(),
            },
            ReminderItem::Title {
                text: "Select the days you want to blog on".into(),
            },
        ];
        let Some(draft) = draft else {
            return items;
        };

        items.push(ReminderItem::DayButtons {
            days: Weekday::ALL
                .into_iter()
                .map(|day| DayButton {
                    day,
                    label: day.short_label().to_string(),
                    selected: draft.enabled_days.contains(&day),
                    action: ItemAction::SelectDay(day),
                })
                .collect(),
        });
        items.push(ReminderItem::Caption {
            text: n_times_label(draft.enabled_days.len()),
        });
        items.push(ReminderItem::TimeRow {
            label: "Notification time".into(),
            time: draft.formatted_time(),
            action: ItemAction::SelectTime,
        });
        items.push(ReminderItem::Tip {
            title: "Tip".into(),
            message: "People who post at least once a week see more traffic.".into(),
        });
        items
    }

    pub fn epilogue_items(&self, draft: Option<&ReminderDraft>) -> Vec<ReminderItem> {
        let (title, body) = match draft {
            Some(draft) if !draft.enabled_days.is_empty() => (
                "All set!",
                format!(
                    "You'll get reminders to blog {} on {} at {}.",
                    n_times_label(draft.enabled_days.len()).to_lowercase(),
                    list_days(&draft.enabled_days),
                    draft.formatted_time()
                ),
            ),
            _ => (
                "Reminders removed",
                "You have no reminders set.".to_string(),
            ),
        };
        vec![
            ReminderItem::Illustration {
                name: "checkmark".into(),
            },
            ReminderItem::Title { text: title.into() },
            ReminderItem::Text { text: body },
            ReminderItem::Caption {
                text: "You can update this any time via My Site > Site Settings.".into(),
            },
        ]
    }

    pub fn prologue_button(&self, is_first_time_flow: bool) -> PrimaryButton {
        PrimaryButton {
            label: "Set reminders".into(),
            enabled: self.prologue_policy.is_enabled(is_first_time_flow),
            action: PrimaryAction::StartSelection { is_first_time_flow },
        }
    }

    pub fn selection_button(
        &self,
        draft: Option<&ReminderDraft>,
        is_first_time_flow: bool,
    ) -> PrimaryButton {
        let label = if is_first_time_flow {
            "Notify me"
        } else {
            "Update"
        };
        PrimaryButton {
            label: label.into(),
            enabled: self.selection_policy.is_enabled(draft, is_first_time_flow),
            action: PrimaryAction::ShowEpilogue(draft.cloned()),
        }
    }

    pub fn epilogue_button(&self) -> PrimaryButton {
        PrimaryButton {
            label: "Done".into(),
            enabled: true,
            action: PrimaryAction::Finish,
        }
    }
}

/// Short frequency label shown in settings rows and the day picker.
pub fn n_times_label(days: usize) -> String {
    match days {
        0 => "Not set".to_string(),
        1 => "Once a week".to_string(),
        2 => "Twice a week".to_string(),
        n => format!("{n} times a week"),
    }
}

fn list_days(days: &BTreeSet<Weekday>) -> String {
    days.iter()
        .map(|day| day.short_label())
        .collect::<Vec<_>>()
        .join(", ")
}
