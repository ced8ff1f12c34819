//! Deterministic simulation module
//!
//! All kinetics live here. This module must be pure and deterministic:
//! - Fixed frame step only
//! - Seeded RNG only, one stream
//! - Stable iteration order (by slot index)
//! - No rendering or platform dependencies

pub mod activation;
pub mod geometry;
pub mod kinetics;
pub mod model;
pub mod motion;
pub mod particle;
pub mod pool;
pub mod repair;
pub mod secondary;
pub mod sites;
pub mod state;
pub mod tick;

pub use activation::ActivationWindow;
pub use geometry::{Geometry, PlasmidOperon, Rect};
pub use model::{Effect, Model, transition_effects};
pub use particle::{
    Body, DeathStage, PrimaryParticle, PrimaryState, SecondaryParticle, SecondaryState, Species,
};
pub use pool::{PrimaryPool, SecondaryPool, StateCounts};
pub use sites::{BindingSite, SiteId, SiteRegistry};
pub use state::{Command, SimEvent, Simulation};
pub use tick::step_frame;
