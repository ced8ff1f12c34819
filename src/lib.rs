//! SOS Sim - frame-stepped particle model of the LexA/RecA SOS response
//!
//! Core modules:
//! - `sim`: Deterministic simulation (particles, operons, kinetics, models A-D)
//! - `settings`: Runtime parameters, declared bounds, JSON configuration
//! - `snapshot`: Read-only per-frame view handed to renderers and charts
//! - `error`: Error taxonomy shared by the core and its collaborators

pub mod error;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use error::SimError;
pub use settings::{Bounds, Parameter, Settings};
pub use sim::{Command, Model, SimEvent, Simulation};
pub use snapshot::Snapshot;

use glam::Vec2;
use rand::Rng;

/// Arena layout constants (pixels, matching the reference canvas)
pub mod consts {
    /// Chromosome strand
    pub const DNA_LENGTH: f32 = 200.0;
    pub const DNA_HEIGHT: f32 = 7.0;

    /// LexA operon on the chromosome, measured from the strand's left end
    pub const OPERON_OFFSET: f32 = 30.0;
    pub const OPERON_LENGTH: f32 = 40.0;

    /// Newly transcribed LexA appears this far past the operon
    pub const SPAWN_GAP: f32 = 10.0;
    /// ...and is released this far before the strand's right end
    pub const RELEASE_INSET: f32 = 10.0;

    /// Plasmid ring radius and the angular width of its operon (radians)
    pub const PLASMID_RADIUS: f32 = 40.0;
    pub const PLASMID_OPERON_ANGLE: f32 = 0.8;

    /// Number of plasmid regulatory sites
    pub const PLASMID_COUNT: usize = 3;

    /// Activation ratio buckets per repair table
    pub const REPAIR_BUCKETS: usize = 10;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Velocity of the given magnitude in a uniformly random direction
#[inline]
pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R, speed: f32) -> Vec2 {
    let theta = rng.random::<f32>() * std::f32::consts::TAU;
    polar_to_cartesian(speed, theta)
}

/// Rescale a velocity to `speed`, keeping its direction.
///
/// A zero vector has no direction, so it is replaced by a random one.
pub fn normalize_speed<R: Rng + ?Sized>(rng: &mut R, vel: Vec2, speed: f32) -> Vec2 {
    let len = vel.length();
    if len == 0.0 {
        return random_velocity(rng, speed);
    }
    vel * (speed / len)
}
