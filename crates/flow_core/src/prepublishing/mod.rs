//! Prepublishing sheet: a home list of actions and one sub-screen per action.

mod navigation;

use std::sync::{Mutex, MutexGuard, PoisonError};

use shared::bundle::Bundle;
use tracing::{debug, warn};

use crate::{
    error::FlowError,
    event::{EventChannel, EventReceiver},
};

pub use navigation::{
    ActionItem, ActionType, ActionsState, NavigationTarget, PostSnapshot, PostVisibility,
    PrepublishingScreen, PublishState, ScreenState, SiteRef, SlideDirection, TagsState,
    VisibilityState, KEY_SCREEN_STATE,
};

#[derive(Default)]
struct NavState {
    site: Option<SiteRef>,
    post: PostSnapshot,
    /// Bottom entry is always `Home` once started.
    stack: Vec<ScreenState>,
}

#[derive(Default)]
pub struct PrepublishingFlowController {
    state: Mutex<NavState>,
    navigation: EventChannel<NavigationTarget>,
    dismiss: EventChannel<()>,
}

impl PrepublishingFlowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigation_target(&self) -> EventReceiver<NavigationTarget> {
        self.navigation.subscribe()
    }

    pub fn dismiss_sheet(&self) -> EventReceiver<()> {
        self.dismiss.subscribe()
    }

    pub fn current_screen(&self) -> Option<PrepublishingScreen> {
        self.lock().stack.last().map(ScreenState::target_screen)
    }

    pub fn stack_depth(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn post(&self) -> PostSnapshot {
        self.lock().post.clone()
    }

    /// Starts the flow once; later calls are ignored. `saved_state` comes from
    /// [`ScreenState::from_bundle`] after a restart.
    pub fn start(&self, site: SiteRef, post: PostSnapshot, saved_state: Option<ScreenState>) {
        let mut state = self.lock();
        if state.site.is_some() {
            debug!("prepublishing: already started site={}", site.site_id);
            return;
        }

        let home = ScreenState::Home(ActionsState::for_post(&post));
        state.stack = vec![home.clone()];
        state.post = post;
        state.site = Some(site.clone());

        match saved_state {
            Some(saved) if saved.target_screen() != PrepublishingScreen::Home => {
                state.stack.push(saved.clone());
                self.emit_navigation(site, saved, SlideDirection::Forward);
            }
            _ => self.emit_navigation(site, home, SlideDirection::Back),
        }
    }

    pub fn on_action_clicked(&self, action_type: ActionType) -> Result<(), FlowError> {
        let mut state = self.lock();
        let Some(site) = state.site.clone() else {
            warn!("prepublishing: action {action_type:?} before start");
            return Err(FlowError::NotStarted);
        };

        let target = ScreenState::initial_for(action_type, &state.post);
        state.stack.truncate(1);
        state.stack.push(target.clone());
        self.emit_navigation(site, target, SlideDirection::Forward);
        Ok(())
    }

    pub fn on_back_clicked(&self) {
        let mut state = self.lock();
        let Some(site) = state.site.clone() else {
            self.dismiss.emit(());
            return;
        };

        if state.stack.len() > 1 {
            let home = ScreenState::Home(ActionsState::for_post(&state.post));
            state.stack = vec![home.clone()];
            self.emit_navigation(site, home, SlideDirection::Back);
        } else {
            self.dismiss.emit(());
        }
    }

    pub fn on_close_clicked(&self) {
        self.dismiss.emit(());
    }

    /// Records the tags picked on the tags screen and redisplays the current screen
    /// with them. The navigation stack keeps its depth.
    pub fn update_tags_state_and_set_to_current(&self, tags: &str) -> Result<(), FlowError> {
        let mut state = self.lock();
        let Some(site) = state.site.clone() else {
            return Err(FlowError::NotStarted);
        };

        let tags = Some(tags.trim())
            .filter(|tags| !tags.is_empty())
            .map(str::to_string);
        state.post.tags = tags.clone();

        let current = match state.stack.last() {
            Some(ScreenState::Tags(_)) => ScreenState::Tags(TagsState { tags }),
            Some(ScreenState::Home(_)) | None => {
                ScreenState::Home(ActionsState::for_post(&state.post))
            }
            Some(other) => other.clone(),
        };
        let direction = match current {
            ScreenState::Home(_) => SlideDirection::Back,
            _ => SlideDirection::Forward,
        };
        state.stack.pop();
        state.stack.push(current.clone());
        self.emit_navigation(site, current, direction);
        Ok(())
    }

    pub fn write_to_bundle(&self, bundle: &mut Bundle) -> Result<(), FlowError> {
        if let Some(current) = self.lock().stack.last() {
            current.write_to_bundle(bundle)?;
        }
        Ok(())
    }

    fn emit_navigation(&self, site: SiteRef, state: ScreenState, direction: SlideDirection) {
        debug!(
            "prepublishing: navigate site={} screen={:?} direction={direction:?}",
            site.site_id,
            state.target_screen()
        );
        self.navigation.emit(NavigationTarget {
            site,
            state,
            direction,
        });
    }

    fn lock(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "../tests/prepublishing_tests.rs"]
mod tests;
