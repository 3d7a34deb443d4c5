use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub samples: u64,
    pub tdelay: u64,
    pub graphics: bool,
    pub sequential: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            samples: 10,
            tdelay: 1,
            graphics: false,
            sequential: false,
        }
    }
}

/// Where the telemetry sources read from.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub proc_stat: PathBuf,
    pub cpuinfo: PathBuf,
    pub utmp: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            proc_stat: PathBuf::from("/proc/stat"),
            cpuinfo: PathBuf::from("/proc/cpuinfo"),
            utmp: PathBuf::from("/var/run/utmp"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON log destination; logging is off without one.
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            level: "info".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysdash").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

/// Settings for one dashboard run, fixed once the workers start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub sample_count: usize,
    pub interval_secs: u64,
    pub show_system_only: bool,
    pub show_users_only: bool,
    pub show_graphics: bool,
    pub sequential_mode: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        let general = GeneralConfig::default();
        RunConfig {
            sample_count: general.samples as usize,
            interval_secs: general.tdelay,
            show_system_only: false,
            show_users_only: false,
            show_graphics: general.graphics,
            sequential_mode: general.sequential,
        }
    }
}

impl RunConfig {
    /// Slack on top of one interval before a missing sample counts as lost.
    const COLLECT_GRACE: Duration = Duration::from_secs(5);

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Memory and CPU sections are hidden only by `--user` alone.
    pub fn shows_usage(&self) -> bool {
        !self.show_users_only || self.show_system_only
    }

    /// The session section is hidden only by `--system` alone.
    pub fn shows_sessions(&self) -> bool {
        self.show_users_only || !self.show_system_only
    }

    /// How long one iteration may wait for its samples.
    pub fn collect_deadline(&self) -> Duration {
        self.interval()
            .saturating_mul(2)
            .saturating_add(Self::COLLECT_GRACE)
    }

    /// Wait after the last frame so in-flight workers wind down.
    pub fn settle_delay(&self) -> Duration {
        self.interval().saturating_sub(Duration::from_secs(1))
    }
}
