use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream::BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use shared::domain::{SiteId, Weekday};

pub const DEFAULT_REMINDER_HOUR: u8 = 10;
pub const DEFAULT_REMINDER_MINUTE: u8 = 0;

/// Persisted blogging reminder settings for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub site_id: SiteId,
    pub enabled_days: BTreeSet<Weekday>,
    pub hour: u8,
    pub minute: u8,
}

impl ReminderSettings {
    /// Settings reported for a site that never saved any.
    pub fn unset(site_id: SiteId) -> Self {
        Self {
            site_id,
            enabled_days: BTreeSet::new(),
            hour: DEFAULT_REMINDER_HOUR,
            minute: DEFAULT_REMINDER_MINUTE,
        }
    }
}

#[async_trait]
pub trait BloggingRemindersStore: Send + Sync {
    /// Current settings for `site_id` followed by every later change.
    async fn observe_reminders(
        &self,
        site_id: SiteId,
    ) -> Result<BoxStream<'static, Result<ReminderSettings>>>;
    async fn update_reminders(&self, settings: &ReminderSettings) -> Result<()>;
    async fn has_modified_reminders(&self, site_id: SiteId) -> Result<bool>;
    async fn is_prompt_shown(&self, site_id: SiteId) -> Result<bool>;
    async fn mark_prompt_shown(&self, site_id: SiteId) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    watchers: Arc<Mutex<HashMap<SiteId, watch::Sender<u64>>>>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every pooled connection to an in-memory database would see its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            watchers: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn load_reminders(&self, site_id: SiteId) -> Result<ReminderSettings> {
        load_reminders(&self.pool, site_id).await
    }

    pub async fn prompt_shown_at(&self, site_id: SiteId) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT shown_at FROM blogging_reminders_prompts WHERE site_id = ?")
            .bind(site_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<DateTime<Utc>, _>(0)))
    }

    async fn notify_changed(&self, site_id: SiteId) {
        let mut watchers = self.watchers.lock().await;
        let Some(sender) = watchers.get(&site_id) else {
            return;
        };
        if sender.receiver_count() == 0 {
            watchers.remove(&site_id);
        } else {
            sender.send_modify(|version| *version += 1);
        }
    }
}

#[async_trait]
impl BloggingRemindersStore for Storage {
    async fn observe_reminders(
        &self,
        site_id: SiteId,
    ) -> Result<BoxStream<'static, Result<ReminderSettings>>> {
        let receiver = {
            let mut watchers = self.watchers.lock().await;
            watchers.retain(|_, sender| sender.receiver_count() > 0);
            watchers
                .entry(site_id)
                .or_insert_with(|| watch::channel(0).0)
                .subscribe()
        };

        let pool = self.pool.clone();
        let stream = WatchStream::new(receiver)
            .then(move |version| {
                let pool = pool.clone();
                async move {
                    debug!("storage: loading reminders site={site_id} version={version}");
                    load_reminders(&pool, site_id).await
                }
            })
            .boxed();
        Ok(stream)
    }

    async fn update_reminders(&self, settings: &ReminderSettings) -> Result<()> {
        if settings.hour > 23 || settings.minute > 59 {
            anyhow::bail!(
                "invalid reminder time {:02}:{:02} for site {}",
                settings.hour,
                settings.minute,
                settings.site_id
            );
        }

        sqlx::query(
            "INSERT INTO blogging_reminders (site_id, enabled_days, hour, minute, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(site_id) DO UPDATE SET
                enabled_days=excluded.enabled_days,
                hour=excluded.hour,
                minute=excluded.minute,
                updated_at=excluded.updated_at",
        )
        .bind(settings.site_id.0)
        .bind(encode_days(&settings.enabled_days))
        .bind(i64::from(settings.hour))
        .bind(i64::from(settings.minute))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save reminders for site {}", settings.site_id))?;

        self.notify_changed(settings.site_id).await;
        Ok(())
    }

    async fn has_modified_reminders(&self, site_id: SiteId) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blogging_reminders WHERE site_id = ?")
                .bind(site_id.0)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn is_prompt_shown(&self, site_id: SiteId) -> Result<bool> {
        Ok(self.prompt_shown_at(site_id).await?.is_some())
    }

    async fn mark_prompt_shown(&self, site_id: SiteId) -> Result<()> {
        sqlx::query(
            "INSERT INTO blogging_reminders_prompts (site_id, shown_at) VALUES (?, ?)
             ON CONFLICT(site_id) DO NOTHING",
        )
        .bind(site_id.0)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to record reminders prompt for site {site_id}"))?;
        Ok(())
    }
}

async fn load_reminders(pool: &Pool<Sqlite>, site_id: SiteId) -> Result<ReminderSettings> {
    let row = sqlx::query(
        "SELECT enabled_days, hour, minute FROM blogging_reminders WHERE site_id = ?",
    )
    .bind(site_id.0)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to load reminders for site {site_id}"))?;

    let Some(row) = row else {
        return Ok(ReminderSettings::unset(site_id));
    };

    let hour = u8::try_from(row.get::<i64, _>(1)).context("stored reminder hour out of range")?;
    let minute =
        u8::try_from(row.get::<i64, _>(2)).context("stored reminder minute out of range")?;
    Ok(ReminderSettings {
        site_id,
        enabled_days: decode_days(site_id, &row.get::<String, _>(0)),
        hour,
        minute,
    })
}

fn encode_days(days: &BTreeSet<Weekday>) -> String {
    days.iter()
        .map(|day| day.name())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_days(site_id: SiteId, raw: &str) -> BTreeSet<Weekday> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let day = Weekday::from_name(name);
            if day.is_none() {
                warn!("storage: ignoring unknown weekday '{name}' site={site_id}");
            }
            day
        })
        .collect()
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
