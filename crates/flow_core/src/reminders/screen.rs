use serde::{Deserialize, Serialize};

/// Sub-screens of the blogging reminders sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Screen {
    Prologue,
    PrologueSettings,
    Selection,
    Epilogue,
}

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::Prologue,
        Screen::PrologueSettings,
        Screen::Selection,
        Screen::Epilogue,
    ];

    pub fn tracking_name(self) -> &'static str {
        match self {
            Screen::Prologue | Screen::PrologueSettings => "main",
            Screen::Selection => "day_picker",
            Screen::Epilogue => "all_set",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Screen::Prologue => "PROLOGUE",
            Screen::PrologueSettings => "PROLOGUE_SETTINGS",
            Screen::Selection => "SELECTION",
            Screen::Epilogue => "EPILOGUE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|screen| screen.name() == name)
    }

    pub fn is_prologue(self) -> bool {
        matches!(self, Screen::Prologue | Screen::PrologueSettings)
    }
}

/// Where the reminders flow was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    PublishFlow,
    BlogSettings,
}

impl Source {
    pub fn tracking_name(self) -> &'static str {
        match self {
            Source::PublishFlow => "publish_flow",
            Source::BlogSettings => "blog_settings",
        }
    }
}
