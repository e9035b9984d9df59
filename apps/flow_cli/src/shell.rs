use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use flow_core::{
    prepublishing::{ActionType, PrepublishingFlowController},
    reminders::{ItemAction, RemindersFlowController, UiState},
    EventReceiver,
};
use serde::Serialize;
use shared::{bundle::Bundle, domain::Weekday};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::watch,
};
use tracing::warn;

#[derive(Debug, PartialEq, Eq)]
pub enum RemindersCommand {
    Day(Weekday),
    Time,
    SetTime { hour: u8, minute: u8 },
    Primary,
    State,
    Save,
    Dismiss,
}

impl RemindersCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let arg = words.next();
        match (command, arg) {
            ("day", Some(day)) => Weekday::parse_loose(day)
                .map(Self::Day)
                .ok_or_else(|| anyhow!("unknown day '{day}'")),
            ("time", None) => Ok(Self::Time),
            ("time", Some(raw)) => {
                let (hour, minute) = raw
                    .split_once(':')
                    .ok_or_else(|| anyhow!("expected HH:MM, got '{raw}'"))?;
                Ok(Self::SetTime {
                    hour: hour.parse().context("hour")?,
                    minute: minute.parse().context("minute")?,
                })
            }
            ("primary", None) => Ok(Self::Primary),
            ("state", None) => Ok(Self::State),
            ("save", None) => Ok(Self::Save),
            ("dismiss", None) => Ok(Self::Dismiss),
            _ => bail!("unknown command '{line}'"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PrepublishCommand {
    Action(ActionType),
    Tags(String),
    Back,
    Close,
    Save,
}

impl PrepublishCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let (command, rest) = line
            .trim()
            .split_once(' ')
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line.trim(), ""));
        match (command, rest) {
            ("open", "publish") => Ok(Self::Action(ActionType::Publish)),
            ("open", "visibility") => Ok(Self::Action(ActionType::Visibility)),
            ("open", "tags") => Ok(Self::Action(ActionType::Tags)),
            ("tags", tags) => Ok(Self::Tags(tags.to_string())),
            ("back", "") => Ok(Self::Back),
            ("close", "") => Ok(Self::Close),
            ("save", "") => Ok(Self::Save),
            _ => bail!("unknown command '{line}'"),
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_ui_state(ui_state: &mut watch::Receiver<UiState>, force: bool) -> Result<()> {
    if force || ui_state.has_changed()? {
        let state = ui_state.borrow_and_update().clone();
        print_json(&serde_json::json!({ "ui_state": state }))?;
    }
    Ok(())
}

/// Returns the payload of a new, not yet handled event.
fn take_event<T: Clone>(receiver: &mut EventReceiver<T>) -> Result<Option<T>> {
    if !receiver.has_changed()? {
        return Ok(None);
    }
    let event = receiver.borrow_and_update().clone();
    Ok(event.and_then(|event| event.take_if_unhandled().cloned()))
}

pub async fn run_reminders(
    controller: Arc<RemindersFlowController>,
    input: impl AsyncBufRead + Unpin,
) -> Result<()> {
    let mut ui_state = controller.ui_state();
    let mut sheet = controller.sheet_visibility();
    print_ui_state(&mut ui_state, true)?;

    let mut lines = input.lines();
    loop {
        if let Some(visible) = take_event(&mut sheet)? {
            print_json(&serde_json::json!({ "sheet_visible": visible }))?;
            if !visible {
                controller.on_dismissed().await;
                break;
            }
        }

        let Some(line) = lines.next_line().await? else {
            controller.on_dismissed().await;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match RemindersCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };

        let result = match command {
            RemindersCommand::Day(day) => controller.on_item_action(ItemAction::SelectDay(day)).await,
            RemindersCommand::Time => controller.on_item_action(ItemAction::SelectTime).await,
            RemindersCommand::SetTime { hour, minute } => {
                controller.on_change_time(hour, minute).await
            }
            RemindersCommand::Primary => {
                match controller.current_ui_state().primary_button {
                    Some(button) if button.enabled => {
                        controller.on_primary_button(button.action).await
                    }
                    Some(_) => {
                        eprintln!("primary button is disabled");
                        Ok(())
                    }
                    None => {
                        eprintln!("no primary button on this screen");
                        Ok(())
                    }
                }
            }
            RemindersCommand::State => {
                print_ui_state(&mut ui_state, true)?;
                Ok(())
            }
            RemindersCommand::Save => {
                let mut bundle = Bundle::new();
                controller.save_state(&mut bundle).await;
                println!("{}", bundle.to_json()?);
                Ok(())
            }
            RemindersCommand::Dismiss => {
                controller.on_dismissed().await;
                break;
            }
        };
        if let Err(err) = result {
            warn!("reminders: command failed: {err}");
            eprintln!("{err}");
        }
        print_ui_state(&mut ui_state, false)?;
    }
    Ok(())
}

pub async fn run_prepublish(
    controller: &PrepublishingFlowController,
    input: impl AsyncBufRead + Unpin,
) -> Result<()> {
    let mut navigation = controller.navigation_target();
    let mut dismiss = controller.dismiss_sheet();

    let mut lines = input.lines();
    loop {
        if let Some(target) = take_event(&mut navigation)? {
            print_json(&serde_json::json!({ "navigate": target }))?;
        }
        if take_event(&mut dismiss)?.is_some() {
            print_json(&serde_json::json!({ "dismissed": true }))?;
            break;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match PrepublishCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };

        let result = match command {
            PrepublishCommand::Action(action_type) => controller.on_action_clicked(action_type),
            PrepublishCommand::Tags(tags) => controller.update_tags_state_and_set_to_current(&tags),
            PrepublishCommand::Back => {
                controller.on_back_clicked();
                Ok(())
            }
            PrepublishCommand::Close => {
                controller.on_close_clicked();
                Ok(())
            }
            PrepublishCommand::Save => {
                let mut bundle = Bundle::new();
                controller
                    .write_to_bundle(&mut bundle)
                    .and_then(|()| bundle.to_json().map_err(Into::into))
                    .map(|json| println!("{json}"))
            }
        };
        if let Err(err) = result {
            warn!("prepublishing: command failed: {err}");
            eprintln!("{err}");
        }
    }
    Ok(())
}
