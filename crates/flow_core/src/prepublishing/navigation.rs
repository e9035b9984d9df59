use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{bundle::Bundle, domain::SiteId, error::BundleError};

pub const KEY_SCREEN_STATE: &str = "prepublishing_screen_state";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    pub site_id: SiteId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostVisibility {
    Public,
    Private,
    PasswordProtected,
}

impl PostVisibility {
    pub fn label(self) -> &'static str {
        match self {
            PostVisibility::Public => "Public",
            PostVisibility::Private => "Private",
            PostVisibility::PasswordProtected => "Password protected",
        }
    }
}

/// The parts of the post being edited that the sheet displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub tags: Option<String>,
    pub visibility: PostVisibility,
    pub publish_at: Option<DateTime<Utc>>,
}

impl Default for PostSnapshot {
    fn default() -> Self {
        Self {
            tags: None,
            visibility: PostVisibility::Public,
            publish_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepublishingScreen {
    Home,
    Publish,
    Visibility,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Publish,
    Visibility,
    Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub action_type: ActionType,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsState {
    pub actions: Vec<ActionItem>,
}

impl ActionsState {
    pub fn for_post(post: &PostSnapshot) -> Self {
        let publish = match post.publish_at {
            Some(at) => at.format("%b %-d, %Y %H:%M").to_string(),
            None => "Immediately".to_string(),
        };
        let tags = post
            .tags
            .as_deref()
            .filter(|tags| !tags.trim().is_empty())
            .unwrap_or("Not set")
            .to_string();
        Self {
            actions: vec![
                ActionItem {
                    action_type: ActionType::Publish,
                    label: "Publish".into(),
                    value: publish,
                },
                ActionItem {
                    action_type: ActionType::Visibility,
                    label: "Visibility".into(),
                    value: post.visibility.label().into(),
                },
                ActionItem {
                    action_type: ActionType::Tags,
                    label: "Tags".into(),
                    value: tags,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishState {
    pub publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityState {
    pub visibility: PostVisibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsState {
    pub tags: Option<String>,
}

/// A screen together with its state; one cannot exist without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", content = "state", rename_all = "snake_case")]
pub enum ScreenState {
    Home(ActionsState),
    Publish(PublishState),
    Visibility(VisibilityState),
    Tags(TagsState),
}

impl ScreenState {
    pub fn target_screen(&self) -> PrepublishingScreen {
        match self {
            ScreenState::Home(_) => PrepublishingScreen::Home,
            ScreenState::Publish(_) => PrepublishingScreen::Publish,
            ScreenState::Visibility(_) => PrepublishingScreen::Visibility,
            ScreenState::Tags(_) => PrepublishingScreen::Tags,
        }
    }

    pub fn initial_for(action_type: ActionType, post: &PostSnapshot) -> Self {
        match action_type {
            ActionType::Publish => ScreenState::Publish(PublishState {
                publish_at: post.publish_at,
            }),
            ActionType::Visibility => ScreenState::Visibility(VisibilityState {
                visibility: post.visibility,
            }),
            ActionType::Tags => ScreenState::Tags(TagsState {
                tags: post.tags.clone(),
            }),
        }
    }

    pub fn write_to_bundle(&self, bundle: &mut Bundle) -> Result<(), BundleError> {
        let encoded = serde_json::to_string(self).map_err(BundleError::Encode)?;
        bundle.put_string(KEY_SCREEN_STATE, encoded);
        Ok(())
    }

    /// `Ok(None)` when nothing was saved.
    pub fn from_bundle(bundle: &Bundle) -> Result<Option<Self>, BundleError> {
        let Some(raw) = bundle.get_string(KEY_SCREEN_STATE) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|err| BundleError::invalid_value(KEY_SCREEN_STATE, err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    /// Sub-screen slides in from the right.
    Forward,
    /// Home slides back in from the left.
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub site: SiteRef,
    pub state: ScreenState,
    pub direction: SlideDirection,
}

impl NavigationTarget {
    pub fn target_screen(&self) -> PrepublishingScreen {
        self.state.target_screen()
    }
}
