mod config;
mod shell;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flow_core::{
    prepublishing::{PostSnapshot, PostVisibility, PrepublishingFlowController, ScreenState, SiteRef},
    reminders::{AllowClearingOutsideFirstTime, Screen, Source, UiBuilders},
    RemindersFlowConfig, RemindersFlowController, TracingAnalytics,
};
use reminder_scheduler::InMemoryReminderScheduler;
use shared::{bundle::Bundle, domain::SiteId};
use storage::Storage;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; missing file means defaults.
    #[arg(long, default_value = "flows.toml")]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    log_filter: Option<String>,
    /// Bundle JSON written by a previous `save`.
    #[arg(long)]
    restore: Option<PathBuf>,
    #[command(subcommand)]
    flow: Flow,
}

#[derive(Subcommand, Debug)]
enum Flow {
    /// Blogging reminders sheet. Commands: day <DAY>, time [HH:MM], primary, state, save, dismiss.
    Reminders {
        #[arg(long)]
        site: i64,
        #[arg(long, value_enum, default_value_t = Entry::Settings)]
        entry: Entry,
        /// Only used with `--entry publish`.
        #[arg(long)]
        first_time: bool,
        #[arg(long)]
        allow_clearing: bool,
    },
    /// Prepublishing sheet. Commands: open <publish|visibility|tags>, tags <TEXT>, back, close, save.
    Prepublish {
        #[arg(long)]
        site: i64,
        #[arg(long, default_value = "My site")]
        site_name: String,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, value_enum, default_value_t = Visibility::Public)]
        visibility: Visibility,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Entry {
    Publish,
    Settings,
    Prologue,
    Selection,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Visibility {
    Public,
    Private,
    PasswordProtected,
}

impl From<Visibility> for PostVisibility {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Public => PostVisibility::Public,
            Visibility::Private => PostVisibility::Private,
            Visibility::PasswordProtected => PostVisibility::PasswordProtected,
        }
    }
}

fn read_bundle(path: Option<&PathBuf>) -> Result<Option<Bundle>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read bundle '{}'", path.display()))?;
    let bundle = Bundle::from_json(&raw)
        .with_context(|| format!("failed to decode bundle '{}'", path.display()))?;
    Ok(Some(bundle))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config)?;
    if let Some(database_url) = &args.database_url {
        settings.database_url = config::normalize_database_url(database_url);
    }
    if let Some(log_filter) = &args.log_filter {
        settings.log_filter = log_filter.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let saved = read_bundle(args.restore.as_ref())?;
    let stdin = BufReader::new(tokio::io::stdin());

    match args.flow {
        Flow::Reminders {
            site,
            entry,
            first_time,
            allow_clearing,
        } => {
            let storage = Storage::new(&settings.database_url)
                .await
                .with_context(|| format!("failed to open '{}'", settings.database_url))?;
            info!("flow_cli: storage ready url={}", settings.database_url);

            let mut builders = UiBuilders::default();
            if settings.allow_clearing_reminders || allow_clearing {
                builders = builders.with_selection_policy(Arc::new(AllowClearingOutsideFirstTime));
            }
            let controller = RemindersFlowController::new(
                Arc::new(storage),
                Arc::new(InMemoryReminderScheduler::new()),
                Arc::new(TracingAnalytics),
                RemindersFlowConfig {
                    prompt_enabled: settings.reminders_prompt_enabled,
                    builders,
                },
            );

            let site_id = SiteId(site);
            match entry {
                Entry::Publish => {
                    if !controller.on_publishing_post(site_id, Some(first_time)).await? {
                        println!("{}", serde_json::json!({ "sheet_visible": false }));
                        return Ok(());
                    }
                }
                Entry::Settings => controller.on_settings_item_clicked(site_id).await?,
                Entry::Prologue => {
                    controller
                        .open(site_id, Screen::Prologue, Source::BlogSettings)
                        .await?
                }
                Entry::Selection => {
                    controller
                        .open(site_id, Screen::Selection, Source::BlogSettings)
                        .await?
                }
            }
            if let Some(bundle) = &saved {
                controller.restore_state(bundle).await;
            }

            shell::run_reminders(controller, stdin).await
        }
        Flow::Prepublish {
            site,
            site_name,
            tags,
            visibility,
        } => {
            let saved_state = match &saved {
                Some(bundle) => ScreenState::from_bundle(bundle)?,
                None => None,
            };
            let controller = PrepublishingFlowController::new();
            controller.start(
                SiteRef {
                    site_id: SiteId(site),
                    name: site_name,
                },
                PostSnapshot {
                    tags,
                    visibility: visibility.into(),
                    publish_at: None,
                },
                saved_state,
            );

            shell::run_prepublish(&controller, stdin).await
        }
    }
}
