//! Particle types and their lifecycle states
//!
//! Both species live in fixed slots; "creating" or "destroying" a particle is
//! a state transition within its slot, never an allocation.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sites::SiteId;

/// Which pool a particle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// LexA, the repressor
    Primary,
    /// RecA, the effector
    Secondary,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Primary => write!(f, "LexA"),
            Species::Secondary => write!(f, "RecA"),
        }
    }
}

/// Remaining cooldown after a removal
///
/// The slot is only reusable once it has counted down through every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathStage {
    Stage1,
    Stage2,
}

impl DeathStage {
    /// Next stage, or `None` once the cooldown is over
    pub fn advance(self) -> Option<DeathStage> {
        match self {
            DeathStage::Stage2 => Some(DeathStage::Stage1),
            DeathStage::Stage1 => None,
        }
    }
}

/// Position, velocity and size shared by both species
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn parked(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }
}

/// Access to the moving part of a particle, so the motion engine can work on
/// either species
pub trait HasBody {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
}

/// LexA lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryState {
    Inactive,
    /// Moving out of the operon; `progress` counts frames since spawn
    Spawning { progress: u32 },
    Free,
    Bound { site: SiteId },
    JustDied(DeathStage),
}

/// A LexA particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryParticle {
    pub id: usize,
    pub body: Body,
    pub state: PrimaryState,
    /// Frames before this particle may bind again
    pub rebind_in: u32,
}

impl PrimaryParticle {
    pub fn new(id: usize, park: Vec2, radius: f32) -> Self {
        Self {
            id,
            body: Body::parked(park, radius),
            state: PrimaryState::Inactive,
            rebind_in: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == PrimaryState::Free
    }

    pub fn bound_site(&self) -> Option<SiteId> {
        match self.state {
            PrimaryState::Bound { site } => Some(site),
            _ => None,
        }
    }
}

impl HasBody for PrimaryParticle {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// RecA lifecycle (no binding, two-stage death)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SecondaryState {
    Inactive,
    /// Moving toward a random `goal` in the arena
    Spawning { progress: u32, goal: Vec2 },
    Free,
    JustDied(DeathStage),
}

/// A RecA particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryParticle {
    pub id: usize,
    pub body: Body,
    pub state: SecondaryState,
}

impl SecondaryParticle {
    pub fn new(id: usize, park: Vec2, radius: f32) -> Self {
        Self {
            id,
            body: Body::parked(park, radius),
            state: SecondaryState::Inactive,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == SecondaryState::Free
    }

    /// Counts toward the logical RecA amount
    pub fn is_live(&self) -> bool {
        matches!(
            self.state,
            SecondaryState::Free | SecondaryState::Spawning { .. }
        )
    }
}

impl HasBody for SecondaryParticle {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}
