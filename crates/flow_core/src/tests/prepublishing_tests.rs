use super::*;
use chrono::{TimeZone, Utc};
use shared::domain::SiteId;

fn site() -> SiteRef {
    SiteRef {
        site_id: SiteId(42),
        name: "Field notes".into(),
    }
}

fn started(post: PostSnapshot) -> PrepublishingFlowController {
    let controller = PrepublishingFlowController::new();
    controller.start(site(), post, None);
    controller
}

fn latest_target(controller: &PrepublishingFlowController) -> NavigationTarget {
    controller
        .navigation_target()
        .borrow()
        .as_ref()
        .expect("navigation event")
        .peek()
        .clone()
}

fn dismissed(controller: &PrepublishingFlowController) -> bool {
    controller.dismiss_sheet().borrow().is_some()
}

#[test]
fn start_shows_home_built_from_post() {
    let post = PostSnapshot {
        tags: Some("rust, travel".into()),
        visibility: PostVisibility::Private,
        publish_at: Some(Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap()),
    };
    let controller = started(post);

    let target = latest_target(&controller);
    assert_eq!(target.target_screen(), PrepublishingScreen::Home);
    assert_eq!(target.direction, SlideDirection::Back);
    assert_eq!(target.site, site());
    assert_eq!(controller.stack_depth(), 1);

    let ScreenState::Home(actions) = target.state else {
        panic!("expected home state");
    };
    let values: Vec<_> = actions
        .actions
        .iter()
        .map(|item| (item.action_type, item.value.as_str()))
        .collect();
    assert_eq!(
        values,
        vec![
            (ActionType::Publish, "Mar 4, 2026 09:30"),
            (ActionType::Visibility, "Private"),
            (ActionType::Tags, "rust, travel"),
        ]
    );
}

#[test]
fn start_is_ignored_once_started() {
    let controller = started(PostSnapshot::default());
    controller
        .on_action_clicked(ActionType::Tags)
        .expect("tags");

    controller.start(
        SiteRef {
            site_id: SiteId(1),
            name: "Other".into(),
        },
        PostSnapshot::default(),
        None,
    );

    assert_eq!(controller.current_screen(), Some(PrepublishingScreen::Tags));
    assert_eq!(latest_target(&controller).site, site());
}

#[test]
fn action_opens_sub_screen_going_forward() {
    let controller = started(PostSnapshot::default());

    controller
        .on_action_clicked(ActionType::Visibility)
        .expect("visibility");

    let target = latest_target(&controller);
    assert_eq!(
        target.state,
        ScreenState::Visibility(VisibilityState {
            visibility: PostVisibility::Public
        })
    );
    assert_eq!(target.direction, SlideDirection::Forward);
    assert_eq!(controller.stack_depth(), 2);

    controller
        .on_action_clicked(ActionType::Publish)
        .expect("publish");
    assert_eq!(controller.stack_depth(), 2);
    assert_eq!(
        controller.current_screen(),
        Some(PrepublishingScreen::Publish)
    );
}

#[test]
fn action_before_start_is_rejected() {
    let controller = PrepublishingFlowController::new();
    let err = controller
        .on_action_clicked(ActionType::Tags)
        .expect_err("not started");
    assert!(matches!(err, FlowError::NotStarted));
    assert!(controller.navigation_target().borrow().is_none());
}

#[test]
fn back_returns_home_then_dismisses() {
    let controller = started(PostSnapshot::default());
    controller
        .on_action_clicked(ActionType::Tags)
        .expect("tags");

    controller.on_back_clicked();
    let target = latest_target(&controller);
    assert_eq!(target.target_screen(), PrepublishingScreen::Home);
    assert_eq!(target.direction, SlideDirection::Back);
    assert_eq!(controller.stack_depth(), 1);
    assert!(!dismissed(&controller));

    controller.on_back_clicked();
    assert!(dismissed(&controller));
    assert_eq!(controller.stack_depth(), 1);
}

#[test]
fn back_before_start_dismisses() {
    let controller = PrepublishingFlowController::new();
    controller.on_back_clicked();
    assert!(dismissed(&controller));
}

#[test]
fn close_dismisses_from_any_screen() {
    let controller = started(PostSnapshot::default());
    controller
        .on_action_clicked(ActionType::Publish)
        .expect("publish");
    let mut dismiss = controller.dismiss_sheet();
    dismiss.borrow_and_update();

    controller.on_close_clicked();
    assert!(dismiss.has_changed().expect("open channel"));
    let event = dismiss.borrow_and_update().clone().expect("dismiss event");
    assert!(event.take_if_unhandled().is_some());
}

#[test]
fn tags_update_redisplays_tags_without_growing_stack() {
    let controller = started(PostSnapshot::default());
    controller
        .on_action_clicked(ActionType::Tags)
        .expect("tags");

    controller
        .update_tags_state_and_set_to_current("rust, async")
        .expect("update");

    assert_eq!(controller.stack_depth(), 2);
    let target = latest_target(&controller);
    assert_eq!(
        target.state,
        ScreenState::Tags(TagsState {
            tags: Some("rust, async".into())
        })
    );
    assert_eq!(target.direction, SlideDirection::Forward);
    assert_eq!(controller.post().tags.as_deref(), Some("rust, async"));

    controller.on_back_clicked();
    let ScreenState::Home(actions) = latest_target(&controller).state else {
        panic!("expected home state");
    };
    assert_eq!(actions.actions[2].value, "rust, async");
}

#[test]
fn blank_tags_clear_the_post_tags() {
    let controller = started(PostSnapshot {
        tags: Some("old".into()),
        ..PostSnapshot::default()
    });

    controller
        .update_tags_state_and_set_to_current("   ")
        .expect("update");

    assert_eq!(controller.post().tags, None);
    assert_eq!(controller.stack_depth(), 1);
    let ScreenState::Home(actions) = latest_target(&controller).state else {
        panic!("expected home state");
    };
    assert_eq!(actions.actions[2].value, "Not set");
}

#[test]
fn tags_update_before_start_is_rejected() {
    let controller = PrepublishingFlowController::new();
    let err = controller
        .update_tags_state_and_set_to_current("rust")
        .expect_err("not started");
    assert!(matches!(err, FlowError::NotStarted));
}

#[test]
fn saved_sub_screen_is_restored_after_restart() {
    let controller = started(PostSnapshot::default());
    controller
        .on_action_clicked(ActionType::Tags)
        .expect("tags");
    controller
        .update_tags_state_and_set_to_current("drafts")
        .expect("update");

    let mut bundle = Bundle::new();
    controller.write_to_bundle(&mut bundle).expect("save");

    let saved = ScreenState::from_bundle(&bundle).expect("decode");
    let restarted = PrepublishingFlowController::new();
    restarted.start(site(), PostSnapshot::default(), saved);

    assert_eq!(restarted.stack_depth(), 2);
    let target = latest_target(&restarted);
    assert_eq!(target.direction, SlideDirection::Forward);
    assert_eq!(
        target.state,
        ScreenState::Tags(TagsState {
            tags: Some("drafts".into())
        })
    );

    restarted.on_back_clicked();
    assert_eq!(
        restarted.current_screen(),
        Some(PrepublishingScreen::Home)
    );
}

#[test]
fn saved_home_starts_at_home() {
    let controller = started(PostSnapshot::default());
    let mut bundle = Bundle::new();
    controller.write_to_bundle(&mut bundle).expect("save");

    let restarted = PrepublishingFlowController::new();
    restarted.start(
        site(),
        PostSnapshot::default(),
        ScreenState::from_bundle(&bundle).expect("decode"),
    );
    assert_eq!(restarted.stack_depth(), 1);
    assert_eq!(latest_target(&restarted).direction, SlideDirection::Back);
}

#[test]
fn missing_or_corrupt_saved_state() {
    assert_eq!(ScreenState::from_bundle(&Bundle::new()).expect("empty"), None);

    let mut bundle = Bundle::new();
    bundle.put_string(KEY_SCREEN_STATE, "{not json");
    let err = ScreenState::from_bundle(&bundle).expect_err("corrupt");
    assert!(err.to_string().contains(KEY_SCREEN_STATE));
}

#[test]
fn navigation_event_is_delivered_once() {
    let controller = started(PostSnapshot::default());
    controller
        .on_action_clicked(ActionType::Tags)
        .expect("tags");

    let first = controller.navigation_target();
    let event = first.borrow().clone().expect("event");
    assert_eq!(
        event.take_if_unhandled().map(NavigationTarget::target_screen),
        Some(PrepublishingScreen::Tags)
    );

    let late = controller.navigation_target();
    let replayed = late.borrow().clone().expect("event");
    assert!(replayed.is_handled());
    assert_eq!(replayed.take_if_unhandled(), None);
}
