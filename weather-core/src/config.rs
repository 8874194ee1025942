use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};

/// Highest accepted frame rate; keeps the frame period well above zero.
pub const MAX_FPS: u32 = 1000;

/// Largest accepted canvas edge, in pixels.
pub const MAX_CANVAS_EDGE: u32 = 16_384;

/// Canvas, layout and timing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Seconds between wall-clock aligned refreshes.
    pub interval_secs: u64,
    /// Target frames per second of the render loop.
    pub fps: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Width of the first (primary) panel.
    pub primary_width: u32,
    /// Width of every other panel; also the smallest legible panel width.
    pub secondary_width: u32,
    pub primary_top: i32,
    pub secondary_top: i32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            interval_secs: 900,
            fps: 60,
            canvas_width: 800,
            canvas_height: 480,
            primary_width: 288,
            secondary_width: 96,
            primary_top: 136,
            secondary_top: 8,
        }
    }
}

impl DisplaySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }
}

/// Diagnostic switches for the fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Dump the raw provider payload to stderr.
    pub debug: bool,
    /// Print a human-readable summary to stderr after each successful fetch.
    pub verbose: bool,
}

/// Switches that change what a panel shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Show humidity instead of the condition text.
    pub show_humidity: bool,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [display]
/// interval_secs = 600
/// canvas_width = 1024
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplaySettings,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.display;
        ensure!(d.interval_secs > 0, "interval_secs must be greater than zero");
        ensure!(d.fps > 0, "fps must be greater than zero");
        ensure!(d.fps <= MAX_FPS, "fps must be at most {MAX_FPS} (got {})", d.fps);
        ensure!(
            d.canvas_width > 0 && d.canvas_height > 0,
            "canvas size must be non-zero (got {}x{})",
            d.canvas_width,
            d.canvas_height
        );
        ensure!(
            d.canvas_width <= MAX_CANVAS_EDGE && d.canvas_height <= MAX_CANVAS_EDGE,
            "canvas size must be at most {MAX_CANVAS_EDGE}x{MAX_CANVAS_EDGE} (got {}x{})",
            d.canvas_width,
            d.canvas_height
        );
        ensure!(
            d.primary_width > 0 && d.secondary_width > 0,
            "panel widths must be greater than zero"
        );
        ensure!(
            d.primary_width <= d.canvas_width && d.secondary_width <= d.canvas_width,
            "panel widths must not exceed canvas_width ({})",
            d.canvas_width
        );
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-display", "weather-display")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
