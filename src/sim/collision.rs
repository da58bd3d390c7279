//! Collision detection for the player against platforms
//!
//! Landing is a swept test: the player's leading edge has to cross the
//! platform surface during this tick's vertical travel. A static overlap test
//! would let a fast fall tunnel straight through a 16px platform.

use super::state::{Platform, Player};

/// Check whether the player landed on `platform` this tick.
///
/// `prev_y` is the player's top edge before vertical integration. Under normal
/// gravity the falling bottom edge must cross the platform top; flipped, the
/// rising top edge must cross the platform bottom.
pub fn crosses_surface(player: &Player, prev_y: f32, platform: &Platform, flipped: bool) -> bool {
    if !platform.overlaps_x(player) {
        return false;
    }

    if flipped {
        if player.vel.y >= 0.0 {
            return false;
        }
        let surface = platform.bottom();
        prev_y >= surface && player.top() <= surface
    } else {
        if player.vel.y <= 0.0 {
            return false;
        }
        let surface = platform.top();
        let prev_bottom = prev_y + player.size.y;
        prev_bottom <= surface && player.bottom() >= surface
    }
}

/// Index of the first platform the player lands on (platforms don't overlap)
pub fn find_landing(
    player: &Player,
    prev_y: f32,
    platforms: &[Platform],
    flipped: bool,
) -> Option<usize> {
    platforms
        .iter()
        .position(|p| crosses_surface(player, prev_y, p, flipped))
}

/// Snap the player's leading edge onto the platform surface
pub fn snap_to_surface(player: &mut Player, platform: &Platform, flipped: bool) {
    player.pos.y = if flipped {
        platform.bottom()
    } else {
        platform.top() - player.size.y
    };
}

/// Horizontal cylinder: leaving one side fully re-enters from the other
pub fn wrap_x(x: f32, width: f32, viewport_width: f32) -> f32 {
    if x + width < 0.0 {
        viewport_width - width
    } else if x > viewport_width {
        0.0
    } else {
        x
    }
}
