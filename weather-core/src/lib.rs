//! Core library for the `weather-display` binary.
//!
//! This crate defines:
//! - The per-location weather snapshot and the fetcher that produces it
//! - The ordered registry of tracked locations
//! - Panel layout on a fixed-size canvas and backend-independent frames
//! - The refresh scheduler and the render loop that ties everything together
//!
//! Windowing and icon rasterization are left to the caller through the
//! [`Display`] and [`Rasterizer`] traits.

pub mod config;
pub mod diagnostics;
pub mod display;
pub mod layout;
pub mod model;
pub mod provider;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod scheduler;

pub use config::{Config, DisplaySettings, FetchOptions, RenderOptions};
pub use diagnostics::Diagnostics;
pub use display::{Display, InputEvent};
pub use layout::{LayoutEngine, PanelGeometry};
pub use model::{FetchStatus, ReportModel, WeatherFields};
pub use provider::{FatalError, Fetcher, OpenWeatherProvider, ProviderError, WeatherProvider};
pub use registry::{Admission, LocationRegistry};
pub use render::{Anchor, Bitmap, Color, DrawCommand, Frame, Painter, Rasterizer};
pub use runtime::{LoopState, RenderLoop};
pub use scheduler::RefreshScheduler;
