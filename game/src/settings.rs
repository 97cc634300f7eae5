use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::PhysicsConfig;

pub const SETTINGS_PATH_ENV: &str = "SPRINGFALL_SETTINGS_PATH";
pub const SEED_ENV: &str = "SPRINGFALL_SEED";
pub const MUTE_ENV: &str = "SPRINGFALL_MUTE";

pub fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

pub fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub spring_volume: f32,
    pub mute_all: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            spring_volume: 1.0,
            mute_all: false,
        }
    }
}

impl AudioSettings {
    pub fn clamp(mut self) -> Self {
        self.master_volume = clamp_unit(self.master_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);
        self.spring_volume = clamp_unit(self.spring_volume);
        self
    }

    pub fn effective_sfx_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn effective_spring_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.spring_volume
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebugSettings {
    /// Draw the pointer target and spring line.
    pub pointer_overlay: bool,
    pub show_fps: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            pointer_overlay: true,
            show_fps: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub debug: DebugSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            audio: AudioSettings::default(),
            physics: PhysicsConfig::default(),
            debug: DebugSettings::default(),
        }
    }
}

impl PlayerSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.audio = self.audio.clamp();
        self.physics = self.physics.sanitized();
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os(SETTINGS_PATH_ENV) {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(base.join("springfall").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<PlayerSettings, SettingsError> {
        let bytes = fs::read(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        let settings = serde_json::from_slice::<PlayerSettings>(&bytes).map_err(|source| {
            SettingsError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(settings.sanitized())
    }

    /// Loads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> PlayerSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(SettingsError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::debug!("no settings at {}; using defaults", self.path.display());
                PlayerSettings::default()
            }
            Err(err) => {
                log::warn!("{err}; using defaults");
                PlayerSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &PlayerSettings) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let text = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(io_err)
    }
}
