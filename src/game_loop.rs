//! Per-frame driver
//!
//! The host calls [`GameLoop::frame`] from its animation callback and keeps
//! rescheduling only while it returns [`LoopControl::Continue`]. The loop
//! never restarts itself: after a pause or game over the host calls `frame`
//! again once the session is running, and the first frame back has `dt = 0`.

use crate::consts::MAX_FRAME_DT_MS;
use crate::render::RenderSink;
use crate::session::Session;
use crate::sim::TickInput;

/// Whether the host should request another frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Frame clock and stats
#[derive(Debug, Clone, Default)]
pub struct GameLoop {
    /// Timestamp of the previous frame (ms), None after a stop
    last_ts: Option<f64>,
    /// Smoothed frames per second
    fps: f64,
    frames: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame: tick once, forward events, draw
    pub fn frame<S: RenderSink + ?Sized>(
        &mut self,
        session: &mut Session,
        timestamp_ms: f64,
        input: &TickInput,
        sink: &mut S,
    ) -> LoopControl {
        if !session.is_running() {
            self.last_ts = None;
            return LoopControl::Stop;
        }

        let elapsed = self
            .last_ts
            .map(|prev| (timestamp_ms - prev).max(0.0))
            .unwrap_or(0.0);
        self.last_ts = Some(timestamp_ms);
        self.record(elapsed);

        session.step(input, elapsed.min(MAX_FRAME_DT_MS));

        for event in session.drain_events() {
            sink.notify(&event);
        }
        sink.draw(&session.frame_view());

        if session.is_running() {
            LoopControl::Continue
        } else {
            self.last_ts = None;
            LoopControl::Stop
        }
    }

    /// Forget the previous timestamp (next frame has `dt = 0`)
    pub fn restart(&mut self) {
        self.last_ts = None;
    }

    fn record(&mut self, elapsed: f64) {
        self.frames += 1;
        if elapsed <= 0.0 {
            return;
        }
        let instant = 1000.0 / elapsed;
        self.fps = if self.fps == 0.0 {
            instant
        } else {
            self.fps * 0.9 + instant * 0.1
        };
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}
