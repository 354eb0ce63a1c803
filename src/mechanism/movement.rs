//! Inertial movement inside the bounded universe

use crate::command::types::Command;
use crate::core::types::Double3D;
use crate::mechanism::{Mechanism, MechanismContext};

/// Cubes are half-open, so a wall coordinate is pulled just inside
const WALL_INSET: f64 = 1e-9;

/// Advance position by velocity for one tick
///
/// A player reaching a wall stops there: the coordinate is clamped and
/// that velocity component is zeroed.
pub struct MovementMechanism;

fn clamp_axis(position: f64, velocity: f64, extent: i64) -> (f64, f64) {
    let upper = extent as f64 - WALL_INSET;
    if position < 0.0 {
        (0.0, 0.0)
    } else if position > upper {
        (upper, 0.0)
    } else {
        (position, velocity)
    }
}

impl Mechanism for MovementMechanism {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command> {
        let player = &mut *ctx.player;
        let settings = ctx.settings;
        let target = player.double4d.spatial() + player.velocity;

        let (x, vx) = clamp_axis(target.x, player.velocity.x, settings.x_dim);
        let (y, vy) = clamp_axis(target.y, player.velocity.y, settings.y_dim);
        let (z, vz) = clamp_axis(target.z, player.velocity.z, settings.z_dim);

        player.set_position(player.double4d.with_spatial(Double3D::new(x, y, z)));
        player.velocity = Double3D::new(vx, vy, vz);
        Vec::new()
    }
}
