//! Engine configuration.
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml`
//! 2. `config/user.toml` (local overrides, not version controlled)
//! 3. Environment variables (`KESTREL_SECTION__KEY`)
//!
//! Every field has a default, so missing files are not an error.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_MAX_BATCH_SIZE;
use crate::logging::LoggingConfig;
use crate::paint::Color;
use crate::time::{Timer, DEFAULT_FIXED_STEP, DEFAULT_MAX_DELTA};

/// Environment variable prefix, e.g. `KESTREL_WINDOW__TITLE`.
pub const ENV_PREFIX: &str = "KESTREL_";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub timer: TimerConfig,
    pub logging: LoggingSection,
}

impl EngineConfig {
    /// Loads from `./config` plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Loads from `config_dir` plus environment overrides.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // KESTREL_RENDERER__MAX_BATCH_SIZE=64 -> renderer.max_batch_size = 64
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: EngineConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.renderer.max_batch_size == 0 {
            return Err(ConfigError::invalid("renderer.max_batch_size must be at least 1"));
        }
        if !(self.timer.fixed_step_hz.is_finite() && self.timer.fixed_step_hz > 0.0) {
            return Err(ConfigError::invalid("timer.fixed_step_hz must be positive"));
        }
        if !(1.0 / self.timer.fixed_step_hz).is_finite() {
            return Err(ConfigError::invalid(format!(
                "timer.fixed_step_hz is too small, got {}",
                self.timer.fixed_step_hz
            )));
        }
        if self.timer.max_delta_ms == 0 {
            return Err(ConfigError::invalid("timer.max_delta_ms must be at least 1"));
        }
        Ok(())
    }
}

/// Window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
    /// Present with FIFO (vsync) instead of immediate/mailbox.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "kestrel".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Batch renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Sprites per draw call.
    pub max_batch_size: usize,
    /// Z range of the orthographic projection.
    pub projection_depth: f32,
    /// Straight-alpha clear color `[r, g, b, a]`.
    pub clear_color: [f32; 4],
}

impl RendererConfig {
    pub fn clear_color(&self) -> Color {
        Color::from_straight_array(self.clear_color)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            projection_depth: 200.0,
            clear_color: [0.5, 0.5, 0.5, 1.0],
        }
    }
}

/// Frame timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Rate of `Timer::single_step`.
    pub fixed_step_hz: f32,
    pub time_scale: f32,
    /// Largest raw delta one update may report.
    pub max_delta_ms: u64,
}

impl TimerConfig {
    /// Builds a timer with these settings.
    ///
    /// Values `validate` would reject fall back to the engine defaults.
    pub fn build(&self) -> Timer {
        let fixed_step = if self.fixed_step_hz > 0.0 {
            Duration::try_from_secs_f32(1.0 / self.fixed_step_hz).unwrap_or(DEFAULT_FIXED_STEP)
        } else {
            DEFAULT_FIXED_STEP
        };
        let max_delta = match self.max_delta_ms {
            0 => DEFAULT_MAX_DELTA,
            ms => Duration::from_millis(ms),
        };
        let mut timer = Timer::new()
            .with_fixed_step(fixed_step)
            .with_max_delta(max_delta);
        timer.set_time_scale(self.time_scale);
        timer
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            fixed_step_hz: 30.0,
            time_scale: 1.0,
            max_delta_ms: 250,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `env_logger` filter, e.g. `"info,kestrel_engine::batch=trace"`.
    /// Falls back to `RUST_LOG` when unset.
    pub filter: Option<String>,
}

impl LoggingSection {
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.filter.clone(),
            ..LoggingConfig::default()
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError { message: e.to_string() }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
