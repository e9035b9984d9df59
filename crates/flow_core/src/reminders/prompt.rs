use std::sync::Arc;

use anyhow::Result;
use shared::domain::SiteId;
use storage::BloggingRemindersStore;

/// Decides whether the reminders prompt is offered after publishing.
pub struct PromptManager {
    store: Arc<dyn BloggingRemindersStore>,
    enabled: bool,
}

impl PromptManager {
    pub fn new(store: Arc<dyn BloggingRemindersStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub async fn should_show_prompt(&self, site_id: SiteId) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        Ok(!self.store.is_prompt_shown(site_id).await?)
    }

    pub async fn prompt_shown(&self, site_id: SiteId) -> Result<()> {
        self.store.mark_prompt_shown(site_id).await
    }
}
