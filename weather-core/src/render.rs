//! Turns the registry and layout into a backend-independent [`Frame`].

use std::{collections::HashMap, sync::Arc};

use crate::{
    config::RenderOptions,
    layout::{LayoutEngine, PanelGeometry},
    model::ReportModel,
    registry::LocationRegistry,
};

pub const WATERMARK: &str = "Source - Open Weather";
const WATERMARK_SIZE: u32 = 16;

/// Palette roles; backends pick the actual colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Background,
    Text,
    DarkText,
    Icon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

/// Monochrome image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl Bitmap {
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`; out of bounds reads as unset.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize]
    }
}

/// Converts a provider icon id into a bitmap of the requested width.
///
/// Must be deterministic for a given `(icon_id, width)`.
pub trait Rasterizer {
    fn rasterize(&self, icon_id: &str, width: u32) -> Bitmap;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Fill { area: PanelGeometry, color: Color },
    Image { x: i32, y: i32, bitmap: Arc<Bitmap>, color: Color, clip: PanelGeometry },
    /// `x` is the anchor point, `y` the top of the line; `size` is the line height in pixels.
    Text { x: i32, y: i32, size: u32, text: String, color: Color, anchor: Anchor },
}

/// Everything to show for one tick, in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, commands: Vec::new() }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// All text drawn in this frame, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Draws panels, rasterizing icons once per `(icon, width)`.
#[derive(Debug)]
pub struct Painter<R> {
    rasterizer: R,
    options: RenderOptions,
    icons: HashMap<(String, u32), Arc<Bitmap>>,
}

impl<R: Rasterizer> Painter<R> {
    pub fn new(rasterizer: R, options: RenderOptions) -> Self {
        Self { rasterizer, options, icons: HashMap::new() }
    }

    /// Background, watermark and one panel per tracked location.
    pub fn compose(&mut self, registry: &LocationRegistry, layout: &LayoutEngine, canvas_height: u32) -> Frame {
        let mut frame = Frame::new(layout.canvas_width(), canvas_height);
        frame.push(DrawCommand::Clear(Color::Background));
        frame.push(DrawCommand::Text {
            x: frame.width as i32 - 2,
            y: (canvas_height.saturating_sub(WATERMARK_SIZE)) as i32,
            size: WATERMARK_SIZE,
            text: WATERMARK.to_string(),
            color: Color::Text,
            anchor: Anchor::Right,
        });

        for (report, geometry) in registry.iter().zip(layout.layout(registry.len())) {
            self.paint_panel(&mut frame, report, &geometry);
        }
        frame
    }

    /// Icon, temperature, info line and name, centred in `geometry`.
    pub fn paint_panel(&mut self, frame: &mut Frame, report: &ReportModel, geometry: &PanelGeometry) {
        let Some(fields) = report.fields() else {
            return;
        };
        let w = geometry.width;
        let center = geometry.center_x();

        frame.push(DrawCommand::Fill { area: *geometry, color: Color::Background });

        let icon = self.icon(&fields.condition_icon_id, icon_width(w));
        frame.push(DrawCommand::Image {
            x: center - (icon.width() / 2) as i32,
            y: geometry.y - (w / 16) as i32,
            bitmap: icon,
            color: Color::Icon,
            clip: *geometry,
        });

        let large = w / 3;
        let small = w / 6;
        let mut top = geometry.y + (w / 24 * 15) as i32;
        let lines = [
            (report.temperature_label(), large),
            (report.info_line(self.options.show_humidity), small),
            (Some(fields.name.clone()), small),
        ];
        for (text, size) in lines {
            if let Some(text) = text {
                frame.push(DrawCommand::Text {
                    x: center,
                    y: top,
                    size,
                    text,
                    color: Color::DarkText,
                    anchor: Anchor::Center,
                });
            }
            top += size as i32;
        }
    }

    fn icon(&mut self, icon_id: &str, width: u32) -> Arc<Bitmap> {
        let rasterizer = &self.rasterizer;
        self.icons
            .entry((icon_id.to_string(), width))
            .or_insert_with(|| Arc::new(rasterizer.rasterize(icon_id, width)))
            .clone()
    }
}

/// The icon takes three quarters of the panel width, leaving room for text below.
pub fn icon_width(panel_width: u32) -> u32 {
    // Always below panel_width, so the narrowing cannot truncate.
    (u64::from(panel_width) * 752 / 1000) as u32
}
