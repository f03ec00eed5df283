use anyhow::{Context, Result};
use chrono::NaiveTime;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Work phase length in seconds
    pub work_time: u64,
    /// Break phase length in seconds
    pub break_time: u64,
    pub sounds: SoundsConfig,
    pub hydration: HydrationConfig,
    pub bedtime: BedtimeConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SoundsConfig {
    pub dir: PathBuf,
    /// Program and leading arguments; the sound file is appended
    pub player: Vec<String>,
    pub work_variants: u32,
    pub rest_variants: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HydrationConfig {
    pub enabled: bool,
    pub min_interval_minutes: u32,
    pub random_extra_minutes: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BedtimeConfig {
    pub enabled: bool,
    #[serde(deserialize_with = "hh_mm_to_time")]
    pub at: NaiveTime,
    pub variants: u32,
}

impl Config {
    pub fn work_duration(&self) -> Duration {
        Duration::from_secs(self.work_time)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(self.break_time)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_time: 50 * 60,
            break_time: 10 * 60,
            sounds: SoundsConfig::default(),
            hydration: HydrationConfig::default(),
            bedtime: BedtimeConfig::default(),
        }
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        let dir = project_dirs()
            .map(|dirs| dirs.data_dir().join("sounds"))
            .unwrap_or_else(|| PathBuf::from("sounds"));
        Self {
            dir,
            player: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
                .into_iter()
                .map(String::from)
                .collect(),
            work_variants: 14,
            rest_variants: 8,
        }
    }
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_minutes: 25,
            random_extra_minutes: 20,
        }
    }
}

impl Default for BedtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            at: NaiveTime::from_hms_opt(23, 30, 0).unwrap_or(NaiveTime::MIN),
            variants: 3,
        }
    }
}

fn hh_mm_to_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "polypomo", "polypomo")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("polypomo.toml"))
}

/// Load the config from `path`, or from the default location when `None`.
/// A missing file at the default location yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => read_config(path),
        None => match default_config_path() {
            Some(path) if path.exists() => read_config(&path),
            _ => Ok(Config::default()),
        },
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file at {:?}", path))
}
