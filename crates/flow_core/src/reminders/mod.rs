//! Blogging reminders sheet: prologue, day/time selection, epilogue.

mod builders;
mod prompt;
mod saved_state;
mod screen;
mod ui_state;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};

use futures::{stream::BoxStream, StreamExt};
use reminder_scheduler::{ReminderScheduler, WeeklyReminder};
use shared::{
    bundle::Bundle,
    domain::{SiteId, Weekday},
};
use storage::{BloggingRemindersStore, ReminderSettings};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    analytics::{AnalyticsSink, RemindersAnalyticsTracker},
    error::FlowError,
    event::{EventChannel, EventReceiver},
};

pub use builders::{
    n_times_label, AllowClearingOutsideFirstTime, AlwaysEnabled, PrologueButtonPolicy,
    RequireEnabledDays, SelectionButtonPolicy, UiBuilders,
};
pub use prompt::PromptManager;
pub use saved_state::{
    SavedFlowState, KEY_IS_FIRST_TIME_FLOW, KEY_SELECTED_DAYS, KEY_SELECTED_HOUR,
    KEY_SELECTED_MINUTE, KEY_SHOWN_SCREEN, KEY_SITE_ID,
};
pub use screen::{Screen, Source};
pub use ui_state::{
    derive_ui_state, DayButton, FlowFlags, FlowInputs, ItemAction, PrimaryAction, PrimaryButton,
    ReminderDraft, ReminderItem, UiState,
};

#[derive(Clone)]
pub struct RemindersFlowConfig {
    /// Offer the prologue after a site's first published post.
    pub prompt_enabled: bool,
    pub builders: UiBuilders,
}

impl Default for RemindersFlowConfig {
    fn default() -> Self {
        Self {
            prompt_enabled: true,
            builders: UiBuilders::default(),
        }
    }
}

pub struct RemindersFlowController {
    store: Arc<dyn BloggingRemindersStore>,
    scheduler: Arc<dyn ReminderScheduler>,
    analytics: RemindersAnalyticsTracker,
    prompts: PromptManager,
    builders: UiBuilders,
    inputs: Mutex<FlowInputs>,
    ui_state: watch::Sender<UiState>,
    sheet_visibility: EventChannel<bool>,
    subscription: Mutex<Option<JoinHandle<()>>>,
    /// Set when a restored draft must survive the subscription's first emission.
    draft_restored: AtomicBool,
}

impl RemindersFlowController {
    pub fn new(
        store: Arc<dyn BloggingRemindersStore>,
        scheduler: Arc<dyn ReminderScheduler>,
        analytics: Arc<dyn AnalyticsSink>,
        config: RemindersFlowConfig,
    ) -> Arc<Self> {
        let (ui_state, _) = watch::channel(UiState::default());
        Arc::new(Self {
            prompts: PromptManager::new(Arc::clone(&store), config.prompt_enabled),
            store,
            scheduler,
            analytics: RemindersAnalyticsTracker::new(analytics),
            builders: config.builders,
            inputs: Mutex::new(FlowInputs::default()),
            ui_state,
            sheet_visibility: EventChannel::new(),
            subscription: Mutex::new(None),
            draft_restored: AtomicBool::new(false),
        })
    }

    /// Derived UI state. Receivers are only woken when the state actually changes.
    pub fn ui_state(&self) -> watch::Receiver<UiState> {
        self.ui_state.subscribe()
    }

    pub fn current_ui_state(&self) -> UiState {
        self.ui_state.borrow().clone()
    }

    /// One-shot `true` when the sheet should appear, `false` when it should close.
    pub fn sheet_visibility(&self) -> EventReceiver<bool> {
        self.sheet_visibility.subscribe()
    }

    pub async fn inputs(&self) -> FlowInputs {
        self.inputs.lock().await.clone()
    }

    pub async fn is_observing(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Entry point after a post is published.
    /// Returns whether the sheet was opened.
    pub async fn on_publishing_post(
        self: &Arc<Self>,
        site_id: SiteId,
        is_first_time_publishing: Option<bool>,
    ) -> Result<bool, FlowError> {
        if is_first_time_publishing != Some(true) {
            return Ok(false);
        }
        let should_show = self
            .prompts
            .should_show_prompt(site_id)
            .await
            .map_err(FlowError::Store)?;
        if !should_show {
            debug!("reminders: prompt already shown or disabled site={site_id}");
            return Ok(false);
        }
        self.open(site_id, Screen::Prologue, Source::PublishFlow)
            .await?;
        Ok(true)
    }

    /// Entry point from the site settings row.
    pub async fn on_settings_item_clicked(self: &Arc<Self>, site_id: SiteId) -> Result<(), FlowError> {
        let modified = self
            .store
            .has_modified_reminders(site_id)
            .await
            .map_err(FlowError::Store)?;
        let screen = if modified {
            Screen::Selection
        } else {
            Screen::PrologueSettings
        };
        self.open(site_id, screen, Source::BlogSettings).await
    }

    /// Frequency label for a settings row, refreshed whenever the stored settings change.
    pub async fn settings_label(
        &self,
        site_id: SiteId,
    ) -> Result<BoxStream<'static, anyhow::Result<String>>, FlowError> {
        let stream = self
            .store
            .observe_reminders(site_id)
            .await
            .map_err(FlowError::Store)?;
        Ok(stream
            .map(|settings| settings.map(|s| n_times_label(s.enabled_days.len())))
            .boxed())
    }

    /// Shows the sheet for `site_id`. The previous store subscription is stopped first;
    /// if the store cannot be observed the sheet is left untouched.
    pub async fn open(
        self: &Arc<Self>,
        site_id: SiteId,
        screen: Screen,
        source: Source,
    ) -> Result<(), FlowError> {
        self.stop_observing().await;
        let stream = self
            .store
            .observe_reminders(site_id)
            .await
            .map_err(FlowError::Store)?;

        let is_prologue = screen.is_prologue();
        if is_prologue {
            self.prompts
                .prompt_shown(site_id)
                .await
                .map_err(FlowError::Store)?;
        }

        self.analytics.set_site(site_id);
        self.analytics.track_flow_start(source);
        info!(
            "reminders: open site={site_id} screen={} source={}",
            screen.name(),
            source.tracking_name()
        );
        self.sheet_visibility.emit(true);
        self.update_inputs(|inputs| {
            if inputs
                .draft
                .as_ref()
                .is_some_and(|draft| draft.site_id != site_id)
            {
                inputs.draft = None;
                self.draft_restored.store(false, Ordering::Release);
            }
            inputs.flags.is_first_time_flow = is_prologue;
            inputs.screen = Some(screen);
        })
        .await;

        self.spawn_subscription(site_id, stream).await;
        Ok(())
    }

    pub async fn select_day(&self, day: Weekday) -> Result<(), FlowError> {
        self.update_inputs(|inputs| {
            let Some(draft) = inputs.draft.as_mut() else {
                return Err(FlowError::DraftNotLoaded);
            };
            draft.toggle_day(day);
            inputs.flags.is_time_picker_active = false;
            Ok(())
        })
        .await
        .inspect_err(|err| warn!("reminders: select_day {day} rejected: {err}"))
    }

    pub async fn select_time(&self) {
        self.update_inputs(|inputs| inputs.flags.is_time_picker_active = true)
            .await;
    }

    pub async fn on_change_time(&self, hour: u8, minute: u8) -> Result<(), FlowError> {
        if hour > 23 || minute > 59 {
            return Err(FlowError::InvalidTime { hour, minute });
        }
        self.update_inputs(|inputs| {
            let Some(draft) = inputs.draft.as_mut() else {
                return Err(FlowError::DraftNotLoaded);
            };
            draft.hour = hour;
            draft.minute = minute;
            inputs.flags.is_time_picker_active = false;
            Ok(())
        })
        .await
        .inspect_err(|err| warn!("reminders: on_change_time rejected: {err}"))
    }

    pub async fn advance_to_selection(&self, is_first_time_flow: bool) {
        self.analytics
            .track_primary_button_pressed(Screen::Prologue);
        self.update_inputs(|inputs| {
            inputs.flags.is_first_time_flow = is_first_time_flow;
            inputs.screen = Some(Screen::Selection);
        })
        .await;
    }

    /// Saves `draft`, then schedules or cancels the site's reminders, then shows the epilogue.
    /// Collaborator failures are returned as-is and leave the screen unchanged.
    pub async fn finish_to_epilogue(&self, draft: Option<ReminderDraft>) -> Result<(), FlowError> {
        self.analytics
            .track_primary_button_pressed(Screen::Selection);
        let Some(draft) = draft else {
            warn!("reminders: epilogue requested before settings loaded");
            return Err(FlowError::DraftNotLoaded);
        };
        let site_id = draft.site_id;

        self.store
            .update_reminders(&draft.to_settings())
            .await
            .map_err(FlowError::Store)?;

        let days = draft.enabled_days.len();
        if days > 0 {
            self.scheduler
                .schedule(
                    site_id,
                    WeeklyReminder {
                        days: draft.enabled_days.clone(),
                        hour: draft.hour,
                        minute: draft.minute,
                    },
                )
                .map_err(FlowError::Scheduler)?;
            self.analytics.track_reminders_scheduled(days);
            info!(
                "reminders: scheduled site={site_id} days={days} at={}",
                draft.formatted_time()
            );
        } else {
            self.scheduler
                .cancel_by_site_id(site_id)
                .map_err(FlowError::Scheduler)?;
            self.analytics.track_reminders_cancelled();
            info!("reminders: cancelled site={site_id}");
        }

        self.update_inputs(|inputs| inputs.screen = Some(Screen::Epilogue))
            .await;
        Ok(())
    }

    pub fn finish(&self) {
        self.analytics
            .track_primary_button_pressed(Screen::Epilogue);
        self.sheet_visibility.emit(false);
    }

    pub async fn on_primary_button(&self, action: PrimaryAction) -> Result<(), FlowError> {
        match action {
            PrimaryAction::StartSelection { is_first_time_flow } => {
                self.advance_to_selection(is_first_time_flow).await;
                Ok(())
            }
            PrimaryAction::ShowEpilogue(draft) => self.finish_to_epilogue(draft).await,
            PrimaryAction::Finish => {
                self.finish();
                Ok(())
            }
        }
    }

    pub async fn on_item_action(&self, action: ItemAction) -> Result<(), FlowError> {
        match action {
            ItemAction::SelectDay(day) => self.select_day(day).await,
            ItemAction::SelectTime => {
                self.select_time().await;
                Ok(())
            }
        }
    }

    /// Sheet closed by the user or after `finish`. Stops observing the store and
    /// discards the draft.
    pub async fn on_dismissed(&self) {
        let screen = self.inputs.lock().await.screen;
        match screen {
            Some(Screen::Epilogue) => self.analytics.track_flow_completed(),
            Some(screen) => self.analytics.track_flow_dismissed(screen),
            None => {}
        }

        self.stop_observing().await;
        self.update_inputs(|inputs| {
            *inputs = FlowInputs::default();
            self.draft_restored.store(false, Ordering::Release);
        })
        .await;
    }

    pub async fn save_state(&self, bundle: &mut Bundle) {
        let inputs = self.inputs.lock().await;
        SavedFlowState {
            screen: inputs.screen,
            draft: inputs.draft.clone(),
            is_first_time_flow: inputs.flags.is_first_time_flow,
        }
        .write_to(bundle);
    }

    pub async fn restore_state(&self, bundle: &Bundle) {
        let saved = SavedFlowState::read_from(bundle);
        self.update_inputs(|inputs| {
            if let Some(screen) = saved.screen {
                inputs.screen = Some(screen);
            }
            if let Some(draft) = saved.draft {
                inputs.draft = Some(draft);
                self.draft_restored.store(true, Ordering::Release);
            }
            inputs.flags.is_first_time_flow = saved.is_first_time_flow;
        })
        .await;
    }

    async fn stop_observing(&self) {
        if let Some(task) = self.subscription.lock().await.take() {
            task.abort();
            debug!("reminders: stopped observing store");
        }
    }

    async fn spawn_subscription(
        self: &Arc<Self>,
        site_id: SiteId,
        mut stream: BoxStream<'static, anyhow::Result<ReminderSettings>>,
    ) {
        let controller: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut first = true;
            while let Some(next) = stream.next().await {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                match next {
                    Ok(settings) => {
                        let is_first = first;
                        first = false;
                        controller
                            .update_inputs(|inputs| {
                                let keep_restored = is_first
                                    && controller.draft_restored.swap(false, Ordering::AcqRel)
                                    && inputs
                                        .draft
                                        .as_ref()
                                        .is_some_and(|draft| draft.site_id == settings.site_id);
                                if keep_restored {
                                    debug!("reminders: keeping restored draft site={site_id}");
                                } else {
                                    inputs.draft = Some(settings.into());
                                }
                            })
                            .await;
                    }
                    Err(err) => {
                        warn!("reminders: failed to load settings site={site_id}: {err:#}");
                    }
                }
            }
        });

        let previous = self.subscription.lock().await.replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Applies `update` and republishes the derived state if it changed.
    async fn update_inputs<R>(&self, update: impl FnOnce(&mut FlowInputs) -> R) -> R {
        let mut inputs = self.inputs.lock().await;
        let previous_screen = inputs.screen;
        let result = update(&mut inputs);

        if inputs.screen != previous_screen {
            if let Some(screen) = inputs.screen {
                self.analytics.track_screen_shown(screen);
            }
        }

        let next = derive_ui_state(&inputs, &self.builders);
        self.ui_state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        result
    }
}

impl Drop for RemindersFlowController {
    fn drop(&mut self) {
        if let Some(task) = self.subscription.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "../tests/reminders_tests.rs"]
mod tests;
