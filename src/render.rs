//! Render sink interface
//!
//! Drawing is a pure consumer of simulation state: each frame the loop hands
//! the sink a [`FrameView`] and forwards the events raised during the tick.

use glam::Vec2;

use crate::settings::Viewport;
use crate::sim::{ChaosMode, GameEvent, SimulationState};

/// Heads-up display values
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub height_m: u32,
    pub round_coins: u32,
    /// None while signed out
    pub hearts: Option<u32>,
    pub total_coins: Option<u32>,
    pub chaos_mode: ChaosMode,
    /// Whole seconds until the next chaos trigger
    pub chaos_countdown_s: u32,
}

/// Everything a sink needs to paint one frame
#[derive(Debug, Clone)]
pub struct FrameView<'a> {
    pub state: &'a SimulationState,
    pub viewport: Viewport,
    pub hud: Hud,
}

impl FrameView<'_> {
    /// World position to screen position
    #[inline]
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x, self.state.to_screen_y(world.y))
    }

    /// Vertical span [top, bottom] in world units is at least partly on screen
    pub fn is_visible(&self, top: f32, bottom: f32) -> bool {
        let top = self.state.to_screen_y(top);
        let bottom = self.state.to_screen_y(bottom);
        bottom >= 0.0 && top <= self.viewport.height
    }
}

/// Consumer of rendered frames
pub trait RenderSink {
    fn draw(&mut self, view: &FrameView<'_>);

    /// Fire-and-forget notifications (alerts, sounds)
    fn notify(&mut self, _event: &GameEvent) {}
}

/// Sink that ignores everything (headless runs)
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn draw(&mut self, _view: &FrameView<'_>) {}
}

/// `0xRRGGBB` as a CSS color string
pub fn css_color(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0xFF_FFFF)
}
