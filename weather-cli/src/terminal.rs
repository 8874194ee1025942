//! Terminal backend: the fixed pixel canvas is scaled onto the terminal.
//!
//! Icons use half-block characters, so each cell shows two vertical samples.

use std::{
    io::{self, IsTerminal, Stdout},
    time::Duration,
};

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color as TermColor};
use crate::diagnostics::DeferredStderr;
use weather_display_core::{Anchor, Bitmap, Color, Display, DrawCommand, Frame, InputEvent, PanelGeometry};

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    stderr: DeferredStderr,
    active: bool,
}

impl TerminalDisplay {
    /// Switches the terminal to raw mode on the alternate screen with the cursor hidden.
    ///
    /// When stderr is the same terminal, `stderr` is held until the display is released.
    pub fn open(caption: &str, stderr: DeferredStderr) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetTitle(caption), Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        if io::stderr().is_terminal() {
            stderr.hold();
        }
        Ok(Self { terminal, stderr, active: true })
    }
}

impl Display for TerminalDisplay {
    fn poll_event(&mut self) -> Result<Option<InputEvent>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }
        Ok(Some(translate(event::read()?)))
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.terminal.draw(|f| {
            let area = f.area();
            paint(f.buffer_mut(), area, frame);
        })?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let restored = disable_raw_mode()
            .and_then(|()| execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture, Show));
        self.stderr.release()?;
        restored?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

fn translate(event: Event) -> InputEvent {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => InputEvent::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputEvent::Quit,
            KeyCode::Char(' ') => InputEvent::Dismiss,
            _ => InputEvent::Other,
        },
        Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Up(_)) => InputEvent::Dismiss,
        _ => InputEvent::Other,
    }
}

fn palette(color: Color) -> TermColor {
    match color {
        Color::Background => TermColor::Rgb(26, 26, 26),
        Color::Text => TermColor::White,
        Color::DarkText => TermColor::Rgb(169, 169, 169),
        Color::Icon => TermColor::Rgb(250, 204, 88),
    }
}

/// Maps canvas pixels to terminal cells and back.
struct Scale {
    area: Rect,
    canvas_width: i64,
    canvas_height: i64,
}

impl Scale {
    fn col(&self, x: i64) -> i64 {
        self.area.x as i64 + (x * self.area.width as i64).div_euclid(self.canvas_width)
    }

    fn row(&self, y: i64) -> i64 {
        self.area.y as i64 + (y * self.area.height as i64).div_euclid(self.canvas_height)
    }

    /// Canvas x at the horizontal centre of `col`.
    fn pixel_x(&self, col: i64) -> f64 {
        ((col - self.area.x as i64) as f64 + 0.5) * self.canvas_width as f64 / self.area.width as f64
    }

    /// Canvas y at `fraction` (0..1) of the height of `row`.
    fn pixel_y(&self, row: i64, fraction: f64) -> f64 {
        ((row - self.area.y as i64) as f64 + fraction) * self.canvas_height as f64 / self.area.height as f64
    }

    fn cols(&self) -> std::ops::Range<i64> {
        self.area.x as i64..self.area.right() as i64
    }

    fn rows(&self) -> std::ops::Range<i64> {
        self.area.y as i64..self.area.bottom() as i64
    }
}

fn paint(buf: &mut Buffer, area: Rect, frame: &Frame) {
    if area.is_empty() || frame.width == 0 || frame.height == 0 {
        return;
    }
    let scale = Scale { area, canvas_width: frame.width as i64, canvas_height: frame.height as i64 };

    for command in &frame.commands {
        match command {
            DrawCommand::Clear(color) => fill_cells(buf, &scale, scale.cols(), scale.rows(), *color),
            DrawCommand::Fill { area, color } => {
                let cols = scale.col(area.x as i64)..scale.col(area.x as i64 + area.width as i64);
                let rows = scale.row(area.y as i64)..scale.row(area.y as i64 + area.height as i64);
                fill_cells(buf, &scale, cols, rows, *color);
            }
            DrawCommand::Image { x, y, bitmap, color, clip } => {
                draw_image(buf, &scale, *x as i64, *y as i64, bitmap, *color, clip)
            }
            DrawCommand::Text { x, y, size, text, color, anchor } => {
                let row = scale.row(*y as i64 + (*size / 2) as i64);
                let len = text.chars().count() as i64;
                let col = match anchor {
                    Anchor::Left => scale.col(*x as i64),
                    Anchor::Center => scale.col(*x as i64) - len / 2,
                    Anchor::Right => scale.col(*x as i64) - len,
                };
                for (i, ch) in text.chars().enumerate() {
                    set_cell(buf, &scale, col + i as i64, row, |cell| {
                        cell.set_char(ch).set_fg(palette(*color));
                    });
                }
            }
        }
    }
}

fn fill_cells(
    buf: &mut Buffer,
    scale: &Scale,
    cols: std::ops::Range<i64>,
    rows: std::ops::Range<i64>,
    color: Color,
) {
    for row in rows {
        for col in cols.clone() {
            set_cell(buf, scale, col, row, |cell| {
                cell.set_char(' ').set_bg(palette(color));
            });
        }
    }
}

fn draw_image(buf: &mut Buffer, scale: &Scale, x: i64, y: i64, bitmap: &Bitmap, color: Color, clip: &PanelGeometry) {
    let cols = scale.col(x)..=scale.col(x + bitmap.width() as i64);
    let rows = scale.row(y)..=scale.row(y + bitmap.height() as i64);

    let sample = |px: f64, py: f64| {
        let (px, py) = (px.floor() as i64, py.floor() as i64);
        clip.contains(px as i32, py as i32) && bitmap.get(px - x, py - y)
    };

    for row in rows {
        for col in cols.clone() {
            let px = scale.pixel_x(col);
            let upper = sample(px, scale.pixel_y(row, 0.25));
            let lower = sample(px, scale.pixel_y(row, 0.75));
            let glyph = match (upper, lower) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => continue,
            };
            set_cell(buf, scale, col, row, |cell| {
                cell.set_char(glyph).set_fg(palette(color));
            });
        }
    }
}

fn set_cell(buf: &mut Buffer, scale: &Scale, col: i64, row: i64, f: impl FnOnce(&mut ratatui::buffer::Cell)) {
    if !scale.cols().contains(&col) || !scale.rows().contains(&row) {
        return;
    }
    if let Some(cell) = buf.cell_mut((col as u16, row as u16)) {
        f(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, MouseButton, MouseEvent};
    use std::sync::Arc;

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width).map(|col| buf[(col, row)].symbol().to_string()).collect()
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(translate(esc), InputEvent::Quit);
        assert_eq!(translate(ctrl_c), InputEvent::Quit);
    }

    #[test]
    fn space_and_click_dismiss() {
        let space = Event::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(translate(space), InputEvent::Dismiss);
        assert_eq!(translate(click), InputEvent::Dismiss);
        assert_eq!(translate(Event::FocusGained), InputEvent::Other);
    }

    #[test]
    fn right_anchored_text_ends_at_edge() {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        let mut frame = Frame::new(800, 480);
        frame.push(DrawCommand::Clear(Color::Background));
        frame.push(DrawCommand::Text {
            x: 800,
            y: 464,
            size: 16,
            text: "Source".into(),
            color: Color::Text,
            anchor: Anchor::Right,
        });
        paint(&mut buf, area, &frame);
        assert!(row_text(&buf, 23).ends_with("Source"));
        assert_eq!(buf[(0, 0)].bg, palette(Color::Background));
    }

    #[test]
    fn centered_text_is_centered() {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        let mut frame = Frame::new(800, 480);
        frame.push(DrawCommand::Text {
            x: 400,
            y: 0,
            size: 20,
            text: "12C".into(),
            color: Color::DarkText,
            anchor: Anchor::Center,
        });
        paint(&mut buf, area, &frame);
        assert_eq!(row_text(&buf, 0).trim(), "12C");
        assert_eq!(buf[(39, 0)].symbol(), "1");
    }

    #[test]
    fn solid_image_fills_its_cells_and_respects_clip() {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        let mut frame = Frame::new(800, 480);
        let bitmap = Arc::new(Bitmap::from_fn(100, 100, |_, _| true));
        frame.push(DrawCommand::Image {
            x: 0,
            y: 0,
            bitmap,
            color: Color::Icon,
            clip: PanelGeometry { x: 0, y: 0, width: 50, height: 100 },
        });
        paint(&mut buf, area, &frame);
        assert_eq!(buf[(0, 0)].symbol(), "█");
        assert_eq!(buf[(4, 4)].symbol(), "█");
        // Right half is clipped away.
        assert_eq!(buf[(6, 0)].symbol(), " ");
    }

    #[test]
    fn text_outside_area_is_dropped() {
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        let mut frame = Frame::new(100, 20);
        frame.push(DrawCommand::Text {
            x: 0,
            y: 50,
            size: 10,
            text: "hidden".into(),
            color: Color::Text,
            anchor: Anchor::Left,
        });
        paint(&mut buf, area, &frame);
        assert_eq!(row_text(&buf, 0).trim(), "");
        assert_eq!(row_text(&buf, 1).trim(), "");
    }
}
