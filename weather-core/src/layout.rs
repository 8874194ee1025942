//! Panel placement on the fixed canvas.
//!
//! The first location gets a large panel centred on the canvas; every other
//! location gets a small panel along the top edge, spread evenly across the
//! full width.

use crate::config::DisplaySettings;

/// Position and size of one panel, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PanelGeometry {
    /// A panel whose height follows from its width.
    pub fn new(x: i32, y: i32, width: u32) -> Self {
        Self { x, y, width, height: panel_height(width) }
    }

    pub fn center_x(&self) -> i32 {
        self.x + (self.width / 2) as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width as i32 && y < self.y + self.height as i32
    }
}

/// Panels are a little taller than wide to leave room for the text under the icon.
pub fn panel_height(width: u32) -> u32 {
    width + width / 6
}

/// Stateless mapping from panel count to panel geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEngine {
    canvas_width: u32,
    primary_width: u32,
    secondary_width: u32,
    primary_top: i32,
    secondary_top: i32,
}

impl LayoutEngine {
    pub fn new(settings: &DisplaySettings) -> Self {
        Self {
            canvas_width: settings.canvas_width,
            primary_width: settings.primary_width,
            secondary_width: settings.secondary_width,
            primary_top: settings.primary_top,
            secondary_top: settings.secondary_top,
        }
    }

    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    /// Geometry for `count` panels, primary first, secondaries left to right.
    pub fn layout(&self, count: usize) -> Vec<PanelGeometry> {
        let mut panels = Vec::with_capacity(count);
        if count == 0 {
            return panels;
        }

        let half_canvas = (self.canvas_width / 2) as i32;
        panels.push(PanelGeometry::new(
            half_canvas - (self.primary_width / 2) as i32,
            self.primary_top,
            self.primary_width,
        ));

        let secondaries = (count - 1) as u32;
        if secondaries > 0 {
            let segment = self.canvas_width / secondaries;
            let half_panel = (self.secondary_width / 2) as i32;
            let mut center = (segment / 2) as i32;
            for _ in 0..secondaries {
                panels.push(PanelGeometry::new(center - half_panel, self.secondary_top, self.secondary_width));
                center += segment as i32;
            }
        }

        panels
    }

    /// Whether one more secondary panel fits next to `secondary_count` existing ones.
    ///
    /// The first secondary always fits; after that each must keep more than
    /// `secondary_width` pixels of canvas to itself.
    pub fn admits_secondary(&self, secondary_count: usize) -> bool {
        secondary_count < 1 || self.canvas_width / (secondary_count as u32 + 1) > self.secondary_width
    }
}
