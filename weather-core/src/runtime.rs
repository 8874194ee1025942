//! The top-level loop: input, drawing and refresh scheduling.
//!
//! Drawing runs at a fixed frame rate. Refreshes run on a background task and
//! report back over a channel, so the loop keeps showing the last good
//! snapshot while a fetch is outstanding.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::DisplaySettings,
    display::{Display, InputEvent},
    layout::LayoutEngine,
    model::ReportModel,
    provider::{FatalError, Fetcher},
    registry::LocationRegistry,
    render::{Painter, Rasterizer},
    scheduler::RefreshScheduler,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// A dismiss gesture was consumed this tick; back to `Running` on the next.
    Dismissed,
    Terminated,
}

#[derive(Debug)]
struct RefreshResult {
    slot: usize,
    outcome: Result<ReportModel, FatalError>,
}

pub struct RenderLoop<D, R> {
    display: D,
    painter: Painter<R>,
    registry: LocationRegistry,
    layout: LayoutEngine,
    scheduler: RefreshScheduler,
    fetcher: Fetcher,
    settings: DisplaySettings,
    state: LoopState,
    refresh: Option<JoinHandle<()>>,
    results_tx: mpsc::UnboundedSender<RefreshResult>,
    results_rx: mpsc::UnboundedReceiver<RefreshResult>,
}

impl<D: Display, R: Rasterizer> RenderLoop<D, R> {
    pub fn new(
        display: D,
        painter: Painter<R>,
        registry: LocationRegistry,
        fetcher: Fetcher,
        settings: &DisplaySettings,
        now: DateTime<Utc>,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            display,
            painter,
            registry,
            layout: LayoutEngine::new(settings),
            scheduler: RefreshScheduler::new(settings.interval(), now),
            fetcher,
            settings: settings.clone(),
            state: LoopState::Running,
            refresh: None,
            results_tx,
            results_rx,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    /// Runs until the user quits or a refresh hits a fatal error.
    ///
    /// The display is released on both paths; an in-flight refresh is abandoned.
    pub async fn run(mut self) -> Result<()> {
        let mut frames = time::interval(self.settings.frame_period());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            locations = self.registry.len(),
            next_refresh = %self.scheduler.next_deadline(),
            "render loop started"
        );

        let outcome = loop {
            frames.tick().await;
            match self.step(Utc::now()) {
                Ok(LoopState::Terminated) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };

        self.abandon_refresh();
        let released = self.display.release();
        outcome.and(released)
    }

    /// One tick: input, pending refresh results, drawing, then the scheduler.
    pub fn step(&mut self, now: DateTime<Utc>) -> Result<LoopState> {
        if self.state == LoopState::Dismissed {
            self.state = LoopState::Running;
        }

        match self.display.poll_event()? {
            Some(InputEvent::Quit) => {
                info!("quit requested");
                self.state = LoopState::Terminated;
                return Ok(self.state);
            }
            Some(InputEvent::Dismiss) => {
                debug!("dismiss gesture consumed");
                self.state = LoopState::Dismissed;
            }
            Some(InputEvent::Other) | None => {}
        }

        self.apply_refresh_results()?;

        let frame = self.painter.compose(&self.registry, &self.layout, self.settings.canvas_height);
        self.display.present(&frame)?;

        if self.scheduler.tick(now) {
            self.start_refresh();
        }

        Ok(self.state)
    }

    fn apply_refresh_results(&mut self) -> Result<()> {
        while let Ok(RefreshResult { slot, outcome }) = self.results_rx.try_recv() {
            match outcome {
                Ok(report) => {
                    self.registry.replace(slot, report);
                }
                Err(fatal) => {
                    error!(location = %fatal.location, error = ?fatal.source, "fatal refresh failure");
                    return Err(fatal.into());
                }
            }
        }
        Ok(())
    }

    fn start_refresh(&mut self) {
        if self.refresh.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("previous refresh still running; skipping this one");
            return;
        }

        let locations = self.registry.locations();
        info!(count = locations.len(), next = %self.scheduler.next_deadline(), "refreshing weather");

        let fetcher = self.fetcher.clone();
        let tx = self.results_tx.clone();
        self.refresh = Some(tokio::spawn(async move {
            for (slot, location) in locations {
                let outcome = fetcher.fetch(&location).await;
                let fatal = outcome.is_err();
                if tx.send(RefreshResult { slot, outcome }).is_err() || fatal {
                    break;
                }
            }
        }));
    }

    fn abandon_refresh(&mut self) {
        if let Some(handle) = self.refresh.take() {
            handle.abort();
        }
    }
}
