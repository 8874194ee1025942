use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::{ArgAction, Parser, error::ErrorKind};
use std::sync::Arc;
use tracing::info;
use weather_display_core::{
    Config, Diagnostics, FetchOptions, Fetcher, LayoutEngine, LocationRegistry, OpenWeatherProvider, Painter,
    RenderLoop, RenderOptions,
};

use crate::{diagnostics::DeferredStderr, glyphs::GlyphRasterizer, terminal::TerminalDisplay};

/// Window caption.
pub const APP_NAME: &str = "Weather Display";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-display",
    version,
    about = "Display weather conditions at LOCATION(s).",
    disable_help_flag = true,
    after_help = "Example:\n  weather-display London \"Portland, OR, US\"   display weather in London and Portland."
)]
pub struct Cli {
    /// Locations to display. The first gets the large panel; add a state or
    /// country code when a name is ambiguous, e.g. "Paris, FR".
    #[arg(value_name = "LOCATION")]
    pub locations: Vec<String>,

    /// Specify the API key.
    #[arg(long, value_name = "KEY")]
    pub appid: Option<String>,

    /// Dump raw provider data as JSON to stderr.
    #[arg(long)]
    pub debug: bool,

    /// Print a summary of each location's weather to stderr after every update.
    #[arg(long)]
    pub verbose: bool,

    /// Show humidity instead of the weather description.
    #[arg(long)]
    pub humidity: bool,

    /// Display this help and exit.
    #[arg(short = '?', long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Parses process arguments. Help and version exit 0, every other error exits 1.
    pub fn parse_or_exit() -> Self {
        Self::try_parse().unwrap_or_else(|e| {
            let code = match e.print() {
                Ok(()) => exit_code(&e),
                Err(io) => {
                    eprintln!("weather-display: could not print usage: {io}");
                    1
                }
            };
            std::process::exit(code)
        })
    }

    pub fn app_id(&self) -> Result<&str> {
        match self.appid.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(anyhow!("APPID not specified (use --appid <key>)")),
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions { debug: self.debug, verbose: self.verbose }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions { show_humidity: self.humidity }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    /// `stderr` carries logs and diagnostics; it is held while the display is open.
    pub async fn run(self, stderr: DeferredStderr) -> Result<()> {
        let provider = Arc::new(OpenWeatherProvider::new(self.app_id()?.to_string()));
        let settings = Config::load()?.display;
        let fetcher = Fetcher::new(provider, self.fetch_options())
            .with_diagnostics(Diagnostics::new(stderr.clone()));
        let layout = LayoutEngine::new(&settings);

        let registry = tokio::select! {
            registry = LocationRegistry::populate(&fetcher, self.locations.as_slice(), &layout) => registry?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted while fetching initial weather");
                return Ok(());
            }
        };

        let display = TerminalDisplay::open(APP_NAME, stderr)?;
        let painter = Painter::new(GlyphRasterizer, self.render_options());
        let render_loop = RenderLoop::new(display, painter, registry, fetcher, &settings, Utc::now());

        tokio::select! {
            outcome = render_loop.run() => outcome,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                Ok(())
            }
        }
    }
}

/// Exit status for a parse failure: 0 when help or version was asked for.
fn exit_code(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}
