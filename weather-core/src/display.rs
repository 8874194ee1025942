use crate::render::Frame;

/// Input the render loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Window close, Ctrl-C or Escape.
    Quit,
    /// Space bar or pointer click. Consumed without any visible effect.
    Dismiss,
    Other,
}

/// The windowing substrate: a fixed-size surface plus an input queue.
pub trait Display {
    /// Next pending input event, without blocking.
    fn poll_event(&mut self) -> anyhow::Result<Option<InputEvent>>;

    /// Shows a fully composed frame.
    fn present(&mut self, frame: &Frame) -> anyhow::Result<()>;

    /// Gives back every resource acquired by the display. Called once, on exit.
    fn release(&mut self) -> anyhow::Result<()>;
}
