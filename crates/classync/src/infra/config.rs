//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::commit::{RefreshPolicy, SelectorCapture};
use crate::app::session::EditorConfig;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".classync/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
///
/// Every setting is optional so that a layer only overrides what it names; accessors fall back
/// to built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub telemetry: Telemetry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settle_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    load_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selector_capture: Option<SelectorCapture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<RefreshPolicy>,
}

impl SyncOptions {
    fn default_settle_delay_ms() -> u64 {
        1000
    }

    fn default_load_timeout_ms() -> u64 {
        5000
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(
            self.settle_delay_ms
                .unwrap_or_else(Self::default_settle_delay_ms),
        )
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(
            self.load_timeout_ms
                .unwrap_or_else(Self::default_load_timeout_ms),
        )
    }

    pub fn selector_capture(&self) -> SelectorCapture {
        self.selector_capture.unwrap_or_default()
    }

    pub fn refresh(&self) -> RefreshPolicy {
        self.refresh.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keybindings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commit: Option<Vec<String>>,
}

impl Keybindings {
    fn default_commit() -> Vec<String> {
        vec!["enter".into(), "tab".into(), "escape".into()]
    }

    pub fn commit(&self) -> Vec<String> {
        self.commit.clone().unwrap_or_else(Self::default_commit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Telemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage_event: Option<String>,
}

impl Telemetry {
    fn default_usage_event() -> &'static str {
        "tailwind action"
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn usage_event(&self) -> String {
        self.usage_event
            .clone()
            .unwrap_or_else(|| Self::default_usage_event().to_owned())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    settle_delay_ms: Option<String>,
    selector_capture: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            settle_delay_ms: env::var("CLASSYNC_SETTLE_DELAY_MS").ok(),
            selector_capture: env::var("CLASSYNC_SELECTOR_CAPTURE").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(settle_delay_ms: &str, selector_capture: &str) -> Self {
        Self {
            settle_delay_ms: Some(settle_delay_ms.to_owned()),
            selector_capture: Some(selector_capture.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        Self::load_with_file(None)
    }

    /// Like [`Config::load`], with an explicit file layered above the workspace config.
    pub fn load_with_file(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        let mut config = Self::load_with_layers(global, workspace, EnvOverrides::default())?;
        if let Some(path) = explicit {
            config = config.merge(Self::from_file(path)?);
        }
        apply_env_overrides(config, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            sync: merge_sync(self.sync, other.sync),
            keybindings: Keybindings {
                commit: other.keybindings.commit.or(self.keybindings.commit),
            },
            telemetry: Telemetry {
                enabled: other.telemetry.enabled.or(self.telemetry.enabled),
                usage_event: other.telemetry.usage_event.or(self.telemetry.usage_event),
            },
        }
    }

    /// Copy of this config with every default spelled out.
    pub fn resolved(&self) -> Self {
        Self {
            sync: SyncOptions {
                settle_delay_ms: Some(self.sync.settle_delay().as_millis() as u64),
                load_timeout_ms: Some(self.sync.load_timeout().as_millis() as u64),
                selector_capture: Some(self.sync.selector_capture()),
                refresh: Some(self.sync.refresh()),
            },
            keybindings: Keybindings {
                commit: Some(self.keybindings.commit()),
            },
            telemetry: Telemetry {
                enabled: Some(self.telemetry.enabled()),
                usage_event: Some(self.telemetry.usage_event()),
            },
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.resolved()).context("failed to serialize config")
    }

    /// Runtime settings for a class editor.
    pub fn editor(&self) -> EditorConfig {
        EditorConfig {
            settle_delay: self.sync.settle_delay(),
            load_timeout: self.sync.load_timeout(),
            selector_capture: self.sync.selector_capture(),
            refresh: self.sync.refresh(),
            commit_keys: self.keybindings.commit(),
            usage_event: self
                .telemetry
                .enabled()
                .then(|| self.telemetry.usage_event()),
        }
    }

    /// Override the settle delay, e.g. from a command line flag.
    pub fn set_settle_delay_ms(&mut self, millis: u64) {
        self.sync.settle_delay_ms = Some(millis);
    }

    pub fn set_selector_capture(&mut self, capture: SelectorCapture) {
        self.sync.selector_capture = Some(capture);
    }
}

fn merge_sync(base: SyncOptions, overlay: SyncOptions) -> SyncOptions {
    SyncOptions {
        settle_delay_ms: overlay.settle_delay_ms.or(base.settle_delay_ms),
        load_timeout_ms: overlay.load_timeout_ms.or(base.load_timeout_ms),
        selector_capture: overlay.selector_capture.or(base.selector_capture),
        refresh: overlay.refresh.or(base.refresh),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("classync/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(delay) = env.settle_delay_ms {
        let millis = delay
            .trim()
            .parse::<u64>()
            .with_context(|| format!("CLASSYNC_SETTLE_DELAY_MS is not a number: {delay}"))?;
        config.sync.settle_delay_ms = Some(millis);
    }
    if let Some(capture) = env.selector_capture {
        config.sync.selector_capture = Some(
            capture
                .parse()
                .context("invalid CLASSYNC_SELECTOR_CAPTURE")?,
        );
    }
    Ok(config)
}
