//! Sync command: exchange events and settings with the remote API.
//!
//! Push happens first: every event past the persisted watermark goes up in
//! one batch. Pull then walks the remote pages from the persisted cursor,
//! deduplicating by id on insert. Settings reconcile last, the newer
//! `updatedAt` winning in either direction.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::{Deserialize, Serialize};

use mt_api::ApiClient;
use mt_core::{Settings, format_timestamp};
use mt_db::Database;

use crate::{Config, config};

#[derive(Debug, Args)]
pub struct SyncArgs {}

#[derive(Debug)]
struct SyncReport {
    pushed: usize,
    pulled: usize,
    settings: SettingsPlan,
}

/// What the settings reconciliation decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsPlan {
    Keep,
    PushLocal,
    PullRemote,
}

fn settings_plan(local: Option<&Settings>, remote: Option<&Settings>) -> SettingsPlan {
    match (local, remote) {
        (Some(local), Some(remote)) => {
            if remote.newer_than(local) {
                SettingsPlan::PullRemote
            } else if local.newer_than(remote) {
                SettingsPlan::PushLocal
            } else {
                SettingsPlan::Keep
            }
        }
        (Some(_), None) => SettingsPlan::PushLocal,
        (None, Some(_)) => SettingsPlan::PullRemote,
        (None, None) => SettingsPlan::Keep,
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    _args: &SyncArgs,
) -> Result<()> {
    let token = config
        .api_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing API token (set MT_API_TOKEN or config.toml)"))?;
    let client = ApiClient::new(config.api_url.clone(), token)?;

    let state_path = config::sync_state_path().context("failed to determine config directory")?;
    let mut state = SyncState::load(&state_path)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let report = runtime.block_on(sync_once(db, &client, &mut state))?;

    state.last_synced_at = Some(format_timestamp(Utc::now()));
    state.save(&state_path)?;

    writeln!(
        writer,
        "Pushed {} events, pulled {} new.",
        report.pushed, report.pulled
    )?;
    match report.settings {
        SettingsPlan::PullRemote => writeln!(writer, "Settings: updated from the remote.")?,
        SettingsPlan::PushLocal => writeln!(writer, "Settings: pushed the local copy.")?,
        SettingsPlan::Keep => {}
    }
    Ok(())
}

async fn sync_once(
    db: &mut Database,
    client: &ApiClient,
    state: &mut SyncState,
) -> Result<SyncReport> {
    // Push everything the server has not seen yet.
    let outgoing = match state.watermark.as_deref() {
        Some(watermark) => db.list_events_after(watermark)?,
        None => db.list_events()?,
    };
    if !outgoing.is_empty() {
        client.post_events(&outgoing).await?;
    }

    // Pull every page past the cursor. The insert deduplicates, so events
    // pushed moments ago coming straight back is harmless.
    let mut pulled = 0;
    loop {
        let page = client.events(state.cursor.as_deref()).await?;
        pulled += db.insert_events(&page.events)?;
        if let Some(next) = page.next_cursor {
            state.cursor = Some(next);
        }
        if !page.has_next_page {
            break;
        }
    }

    let settings = reconcile_settings(db, client).await?;

    // The pull folded our own push back in, so the newest stored id is
    // also the server watermark.
    state.watermark = db.latest_event_id()?;

    Ok(SyncReport {
        pushed: outgoing.len(),
        pulled,
        settings,
    })
}

async fn reconcile_settings(db: &mut Database, client: &ApiClient) -> Result<SettingsPlan> {
    let local = db.settings()?;
    let remote = client.settings().await?;

    let plan = settings_plan(local.as_ref(), remote.as_ref());
    match plan {
        SettingsPlan::PullRemote => {
            if let Some(remote) = remote {
                db.put_settings(&remote)?;
            }
        }
        SettingsPlan::PushLocal => {
            if let Some(local) = local {
                client.put_settings(&local).await?;
            }
        }
        SettingsPlan::Keep => {}
    }
    Ok(plan)
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SyncState {
    /// Remote pagination cursor to resume pulling from.
    pub(crate) cursor: Option<String>,
    /// Highest event id known to be on the server.
    pub(crate) watermark: Option<String>,
    pub(crate) last_synced_at: Option<String>,
}

impl SyncState {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let parsed = serde_json::from_str(&contents)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                Ok(parsed)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to encode sync state")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(updated_at: &str) -> Settings {
        Settings {
            updated_at: updated_at.to_string(),
            record_location: false,
        }
    }

    #[test]
    fn missing_settings_sync_toward_the_populated_side() {
        let local = settings("2021-01-01T00:00:00.000Z");
        assert_eq!(settings_plan(None, None), SettingsPlan::Keep);
        assert_eq!(settings_plan(Some(&local), None), SettingsPlan::PushLocal);
        assert_eq!(settings_plan(None, Some(&local)), SettingsPlan::PullRemote);
    }

    #[test]
    fn newer_settings_win() {
        let older = settings("2021-01-01T00:00:00.000Z");
        let newer = settings("2021-06-01T00:00:00.000Z");
        assert_eq!(
            settings_plan(Some(&older), Some(&newer)),
            SettingsPlan::PullRemote
        );
        assert_eq!(
            settings_plan(Some(&newer), Some(&older)),
            SettingsPlan::PushLocal
        );
    }

    #[test]
    fn equal_settings_stay_put() {
        let local = settings("2021-01-01T00:00:00.000Z");
        let remote = settings("2021-01-01T00:00:00.000Z");
        assert_eq!(settings_plan(Some(&local), Some(&remote)), SettingsPlan::Keep);
    }

    #[test]
    fn load_missing_state_returns_default() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.json");
        let state = SyncState::load(&path).unwrap();
        assert!(state.cursor.is_none());
        assert!(state.watermark.is_none());
        assert!(state.last_synced_at.is_none());
    }

    #[test]
    fn sync_state_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("sync.json");
        let state = SyncState {
            cursor: Some("page-4".to_string()),
            watermark: Some("2021-01-01T00:00:00.000Z".to_string()),
            last_synced_at: Some("2021-01-02T00:00:00.000Z".to_string()),
        };
        state.save(&path).unwrap();

        let loaded = SyncState::load(&path).unwrap();
        assert_eq!(loaded.cursor.as_deref(), Some("page-4"));
        assert_eq!(
            loaded.watermark.as_deref(),
            Some("2021-01-01T00:00:00.000Z")
        );
        assert_eq!(
            loaded.last_synced_at.as_deref(),
            Some("2021-01-02T00:00:00.000Z")
        );
    }

    #[test]
    fn corrupt_state_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sync.json");
        fs::write(&path, "not json").unwrap();
        assert!(SyncState::load(&path).is_err());
    }
}
