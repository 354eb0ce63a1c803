//! Light delay and time dilation
//!
//! A simplified model: delay is distance over the speed of light rounded
//! up to whole ticks, and proper time advances by `1 / gamma` per tick.

use crate::core::types::{Int3D, Tick, Velocity};

/// Ticks light needs to travel between two cubes
///
/// Rounded up, so an image received with delay `L` is never younger than
/// `distance / speed_of_light`.
pub fn int_delay(from: Int3D, to: Int3D, speed_of_light: f64) -> Tick {
    (from.distance(&to) / speed_of_light).ceil() as Tick
}

/// Lorentz factor for `velocity`
///
/// Infinite at or above the speed of light.
pub fn gamma(velocity: Velocity, speed_of_light: f64) -> f64 {
    let dilation = dilation_factor(velocity, speed_of_light);
    if dilation > 0.0 {
        1.0 / dilation
    } else {
        f64::INFINITY
    }
}

/// Proper time elapsed per tick of universe time, `1 / gamma`
pub fn dilation_factor(velocity: Velocity, speed_of_light: f64) -> f64 {
    let beta = velocity.mag() / speed_of_light;
    (1.0 - beta * beta).max(0.0).sqrt()
}

/// Largest distance whose light still arrives within the look-back window
pub fn visible_range(speed_of_light: f64, t_dim: Tick) -> f64 {
    speed_of_light * (t_dim - 1).max(0) as f64
}
