//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Unique identifier for players
///
/// Ids are handed out by the [`IdAllocator`](crate::core::ids::IdAllocator)
/// and never reused within one simulation.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display(fmt = "P{}", _0)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Universe tick counter (undilated time)
pub type Tick = i64;

/// Integer spatial cube coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int3D {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Int3D {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        let dz = (self.z - other.z) as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Integer spacetime coordinate `(t, x, y, z)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int4D {
    pub t: Tick,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Int4D {
    pub fn new(t: Tick, x: i64, y: i64, z: i64) -> Self {
        Self { t, x, y, z }
    }

    pub fn to_int3d(&self) -> Int3D {
        Int3D::new(self.x, self.y, self.z)
    }

    /// Center of this cube as a precise coordinate
    pub fn to_center_double4d(&self) -> Double4D {
        Double4D::new(
            self.t as f64,
            self.x as f64 + 0.5,
            self.y as f64 + 0.5,
            self.z as f64 + 0.5,
        )
    }
}

/// Precise spatial vector, used for velocities and displacements
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Double3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Velocity in distance units per tick
pub type Velocity = Double3D;

impl Double3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn mag(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalize(&self) -> Self {
        let len = self.mag();
        if len > 1e-12 {
            *self * (1.0 / len)
        } else {
            Self::zero()
        }
    }

    /// Same direction with magnitude capped at `max`
    pub fn clamp_mag(&self, max: f64) -> Self {
        let len = self.mag();
        if len > max {
            self.normalize() * max
        } else {
            *self
        }
    }
}

impl std::ops::Add for Double3D {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Double3D {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Double3D {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Precise spacetime coordinate; its floor is the owning [`Int4D`] cube
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Double4D {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Double4D {
    pub fn new(t: f64, x: f64, y: f64, z: f64) -> Self {
        Self { t, x, y, z }
    }

    pub fn to_int4d(&self) -> Int4D {
        Int4D::new(
            self.t.floor() as Tick,
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }

    pub fn spatial(&self) -> Double3D {
        Double3D::new(self.x, self.y, self.z)
    }

    pub fn with_spatial(&self, p: Double3D) -> Self {
        Self::new(self.t, p.x, p.y, p.z)
    }
}
