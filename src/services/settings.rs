//! Settings store
//!
//! User-facing preferences live in one immutable [`Settings`] snapshot held
//! by a single [`SettingsStore`]. Readers take the current `Arc<Settings>`
//! or subscribe to a watch channel; writers go through [`SettingsStore::update`],
//! which validates, persists to the key/value table, then publishes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::db::repositories::SettingsRepository;
use crate::services::markdown::{RenderOptions, Ruleset};

/// Known setting keys
pub mod keys {
    pub const THEME: &str = "theme";
    pub const FONT_SIZE: &str = "font_size";
    pub const OPEN_LINKS_IN_NEW_TAB: &str = "open_links_in_new_tab";
    pub const CHAT_ENABLED: &str = "chat_enabled";
}

pub const MIN_FONT_SIZE: u16 = 10;
pub const MAX_FONT_SIZE: u16 = 32;
const DEFAULT_FONT_SIZE: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = SettingsServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(SettingsServiceError::InvalidValue(format!(
                "Unknown theme '{}'",
                other
            ))),
        }
    }
}

/// Immutable settings snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub font_size: u16,
    pub open_links_in_new_tab: bool,
    pub chat_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: DEFAULT_FONT_SIZE,
            open_links_in_new_tab: true,
            chat_enabled: true,
        }
    }
}

impl Settings {
    /// Build from stored pairs. Missing or unreadable values keep their
    /// defaults.
    pub fn from_pairs(pairs: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        fn parsed<T: std::str::FromStr>(pairs: &HashMap<String, String>, key: &str) -> Option<T> {
            let raw = pairs.get(key)?;
            let value = raw.trim().parse().ok();
            if value.is_none() {
                tracing::warn!("Ignoring unreadable setting {}={:?}", key, raw);
            }
            value
        }

        Self {
            theme: parsed(pairs, keys::THEME).unwrap_or(defaults.theme),
            font_size: parsed(pairs, keys::FONT_SIZE)
                .filter(|size| (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(size))
                .unwrap_or(defaults.font_size),
            open_links_in_new_tab: parsed(pairs, keys::OPEN_LINKS_IN_NEW_TAB)
                .unwrap_or(defaults.open_links_in_new_tab),
            chat_enabled: parsed(pairs, keys::CHAT_ENABLED).unwrap_or(defaults.chat_enabled),
        }
    }

    pub fn to_pairs(&self) -> HashMap<String, String> {
        HashMap::from([
            (keys::THEME.to_string(), self.theme.as_str().to_string()),
            (keys::FONT_SIZE.to_string(), self.font_size.to_string()),
            (
                keys::OPEN_LINKS_IN_NEW_TAB.to_string(),
                self.open_links_in_new_tab.to_string(),
            ),
            (keys::CHAT_ENABLED.to_string(), self.chat_enabled.to_string()),
        ])
    }

    /// New snapshot with the patch applied
    pub fn apply(&self, patch: &SettingsPatch) -> Result<Self, SettingsServiceError> {
        let mut next = self.clone();
        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(font_size) = patch.font_size {
            if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
                return Err(SettingsServiceError::InvalidValue(format!(
                    "Font size must be between {} and {}",
                    MIN_FONT_SIZE, MAX_FONT_SIZE
                )));
            }
            next.font_size = font_size;
        }
        if let Some(open) = patch.open_links_in_new_tab {
            next.open_links_in_new_tab = open;
        }
        if let Some(enabled) = patch.chat_enabled {
            next.chat_enabled = enabled;
        }
        Ok(next)
    }

    pub fn render_options(&self, ruleset: Ruleset) -> RenderOptions {
        RenderOptions {
            ruleset,
            open_links_in_new_tab: self.open_links_in_new_tab,
        }
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub font_size: Option<u16>,
    pub open_links_in_new_tab: Option<bool>,
    pub chat_enabled: Option<bool>,
}

/// Settings service errors
#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error("Invalid setting value: {0}")]
    InvalidValue(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Process-wide owner of the settings snapshot
pub struct SettingsStore {
    repo: Arc<dyn SettingsRepository>,
    tx: watch::Sender<Arc<Settings>>,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Load the persisted snapshot
    pub async fn load(repo: Arc<dyn SettingsRepository>) -> Result<Self, SettingsServiceError> {
        let pairs: HashMap<String, String> = repo
            .get_all()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();
        let settings = Settings::from_pairs(&pairs);
        tracing::debug!("Loaded settings: {:?}", settings);

        let (tx, _rx) = watch::channel(Arc::new(settings));
        Ok(Self {
            repo,
            tx,
            write_lock: Mutex::new(()),
        })
    }

    pub fn current(&self) -> Arc<Settings> {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every successful update
    pub fn subscribe(&self) -> watch::Receiver<Arc<Settings>> {
        self.tx.subscribe()
    }

    /// Validate, persist, then publish. Nothing is published when
    /// validation or persistence fails.
    pub async fn update(&self, patch: SettingsPatch) -> Result<Arc<Settings>, SettingsServiceError> {
        let _guard = self.write_lock.lock().await;

        let next = Arc::new(self.current().apply(&patch)?);
        self.repo.set_many(&next.to_pairs()).await?;
        self.tx.send_replace(next.clone());

        tracing::info!("Settings updated: {:?}", next);
        Ok(next)
    }

    pub fn render_options(&self, ruleset: Ruleset) -> RenderOptions {
        self.current().render_options(ruleset)
    }
}
