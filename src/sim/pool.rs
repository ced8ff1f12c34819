//! Fixed-capacity particle pools for both species
//!
//! Slots are allocated once. Spawning picks the first `Inactive` slot, so a
//! slot still counting down through `JustDied` is never reused early.

use glam::Vec2;
use rand::Rng;
use rand::seq::index;
use serde::Serialize;

use super::geometry::Geometry;
use super::motion::{self, Arena};
use super::particle::{
    DeathStage, PrimaryParticle, PrimaryState, SecondaryParticle, SecondaryState, Species,
};
use super::sites::{SiteId, SiteRegistry};
use crate::error::SimError;
use crate::random_velocity;
use crate::settings::SpeciesSettings;

/// How many slots are in each lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub inactive: usize,
    pub spawning: usize,
    pub free: usize,
    pub bound: usize,
    pub just_died: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.inactive + self.spawning + self.free + self.bound + self.just_died
    }
}

/// LexA pool
///
/// `roaming` lists the free particles (the ones motion and degradation work
/// on) in the order they became free.
#[derive(Debug, Clone)]
pub struct PrimaryPool {
    particles: Vec<PrimaryParticle>,
    roaming: Vec<usize>,
    species: SpeciesSettings,
    park: Vec2,
}

impl PrimaryPool {
    pub fn new(species: &SpeciesSettings, park: Vec2) -> Self {
        let particles = (0..species.capacity)
            .map(|id| PrimaryParticle::new(id, park, species.radius))
            .collect();
        Self {
            particles,
            roaming: Vec::with_capacity(species.capacity),
            species: species.clone(),
            park,
        }
    }

    pub fn particles(&self) -> &[PrimaryParticle] {
        &self.particles
    }

    pub fn roaming(&self) -> &[usize] {
        &self.roaming
    }

    /// Free roaming particle count (the LexA amount)
    pub fn amount(&self) -> usize {
        self.roaming.len()
    }

    /// Start a spawn animation in the first inactive slot
    pub fn spawn(&mut self) -> Result<usize, SimError> {
        let slot = self
            .particles
            .iter_mut()
            .find(|p| p.state == PrimaryState::Inactive)
            .ok_or(SimError::ResourceExhausted(Species::Primary))?;
        slot.state = PrimaryState::Spawning { progress: 0 };
        slot.body.pos = self.park;
        slot.body.vel = Vec2::ZERO;
        slot.rebind_in = 0;
        Ok(slot.id)
    }

    /// Move spawning particles along the strand; finished ones start roaming
    pub fn advance_spawning<R: Rng + ?Sized>(&mut self, rng: &mut R, geometry: &Geometry) {
        let duration = self.species.spawn_duration;
        for p in &mut self.particles {
            let PrimaryState::Spawning { progress } = p.state else {
                continue;
            };
            if progress >= duration {
                p.state = PrimaryState::Free;
                p.body.vel = random_velocity(rng, self.species.speed);
                self.roaming.push(p.id);
            } else {
                let progress = progress + 1;
                p.state = PrimaryState::Spawning { progress };
                p.body.pos = geometry.primary_spawn_position(progress, duration);
            }
        }
    }

    /// Remove a free particle. Killing anything else is a programming error.
    pub fn kill(&mut self, id: usize) {
        let p = &mut self.particles[id];
        if p.state != PrimaryState::Free {
            debug_assert!(false, "LexA {} killed while {:?}", id, p.state);
            log::error!("Invariant violation: LexA {} killed while {:?}", id, p.state);
            return;
        }
        p.state = PrimaryState::JustDied(DeathStage::Stage1);
        self.roaming.retain(|&i| i != id);
    }

    /// Kill `count` distinct roaming particles chosen uniformly at random
    pub fn kill_random<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> usize {
        let count = count.min(self.roaming.len());
        if count == 0 {
            return 0;
        }
        let victims: Vec<usize> = index::sample(rng, self.roaming.len(), count)
            .into_iter()
            .map(|n| self.roaming[n])
            .collect();
        for &id in &victims {
            self.particles[id].state = PrimaryState::JustDied(DeathStage::Stage1);
        }
        let particles = &self.particles;
        self.roaming.retain(|&i| particles[i].is_free());
        victims.len()
    }

    /// End the one-frame death cooldown: park dead slots and make them reusable
    pub fn finish_deaths(&mut self) {
        for p in &mut self.particles {
            if let PrimaryState::JustDied(stage) = p.state {
                match stage.advance() {
                    Some(next) => p.state = PrimaryState::JustDied(next),
                    None => {
                        p.state = PrimaryState::Inactive;
                        p.body.pos = self.park;
                        p.body.vel = Vec2::ZERO;
                    }
                }
            }
        }
    }

    pub fn tick_refractory(&mut self) {
        for p in &mut self.particles {
            p.rebind_in = p.rebind_in.saturating_sub(1);
        }
    }

    /// Move every roaming particle, letting `sites` capture them as they go.
    /// Captured particles leave the roaming set. Returns the captures.
    pub fn step_motion<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        arena: &Arena,
        sites: &mut SiteRegistry,
    ) -> Vec<(usize, SiteId)> {
        let mut captures = Vec::new();
        let members = std::mem::take(&mut self.roaming);
        motion::step(
            rng,
            &mut self.particles,
            &members,
            arena,
            &self.species,
            |i, p| match sites.try_capture(p) {
                Some(site) => {
                    captures.push((i, site));
                    true
                }
                None => false,
            },
        );
        self.roaming = members;
        if !captures.is_empty() {
            let particles = &self.particles;
            self.roaming.retain(|&i| particles[i].is_free());
        }
        captures
    }

    /// Return a bound particle to circulation with a fresh heading
    pub fn release<R: Rng + ?Sized>(&mut self, rng: &mut R, id: usize, refractory: u32) {
        let p = &mut self.particles[id];
        if p.bound_site().is_none() {
            debug_assert!(false, "LexA {} released while {:?}", id, p.state);
            log::error!("Invariant violation: LexA {} released while {:?}", id, p.state);
            return;
        }
        p.state = PrimaryState::Free;
        p.body.vel = random_velocity(rng, self.species.speed);
        p.rebind_in = refractory;
        self.roaming.push(id);
    }

    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for p in &self.particles {
            match p.state {
                PrimaryState::Inactive => counts.inactive += 1,
                PrimaryState::Spawning { .. } => counts.spawning += 1,
                PrimaryState::Free => counts.free += 1,
                PrimaryState::Bound { .. } => counts.bound += 1,
                PrimaryState::JustDied(_) => counts.just_died += 1,
            }
        }
        counts
    }

    /// Put a particle straight into circulation (test setup)
    #[cfg(test)]
    pub fn place_free(&mut self, pos: Vec2, vel: Vec2) -> usize {
        let id = self.spawn().expect("free slot");
        let p = &mut self.particles[id];
        p.state = PrimaryState::Free;
        p.body.pos = pos;
        p.body.vel = vel;
        self.roaming.push(id);
        id
    }
}

/// RecA pool
#[derive(Debug, Clone)]
pub struct SecondaryPool {
    particles: Vec<SecondaryParticle>,
    species: SpeciesSettings,
    park: Vec2,
}

impl SecondaryPool {
    pub fn new(species: &SpeciesSettings, park: Vec2) -> Self {
        let particles = (0..species.capacity)
            .map(|id| SecondaryParticle::new(id, park, species.radius))
            .collect();
        Self {
            particles,
            species: species.clone(),
            park,
        }
    }

    pub fn particles(&self) -> &[SecondaryParticle] {
        &self.particles
    }

    /// Logical RecA count: free plus spawning
    pub fn amount(&self) -> usize {
        self.particles.iter().filter(|p| p.is_live()).count()
    }

    /// Free particles in slot order
    pub fn free_members(&self) -> Vec<usize> {
        self.particles
            .iter()
            .filter(|p| p.is_free())
            .map(|p| p.id)
            .collect()
    }

    /// Start a spawn in the first inactive slot, or failing that the first
    /// slot still in its death cooldown
    fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, arena: &Arena) -> Result<usize, SimError> {
        let index = self
            .particles
            .iter()
            .position(|p| p.state == SecondaryState::Inactive)
            .or_else(|| {
                self.particles
                    .iter()
                    .position(|p| matches!(p.state, SecondaryState::JustDied(_)))
            })
            .ok_or(SimError::ResourceExhausted(Species::Secondary))?;
        let slot = &mut self.particles[index];
        slot.state = SecondaryState::Spawning {
            progress: 0,
            goal: arena.random_interior(rng),
        };
        slot.body.pos = self.park;
        slot.body.vel = Vec2::ZERO;
        Ok(slot.id)
    }

    /// Spawn or remove particles until the live count equals `target`.
    ///
    /// Removal takes the first live slots in slot order. Only when every slot
    /// is live are the remaining spawns skipped and the error returned.
    pub fn set_target<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        arena: &Arena,
        target: usize,
    ) -> Result<(), SimError> {
        let current = self.amount();
        if target < current {
            let mut to_remove = current - target;
            for p in &mut self.particles {
                if to_remove == 0 {
                    break;
                }
                if p.is_live() {
                    p.state = SecondaryState::JustDied(DeathStage::Stage2);
                    to_remove -= 1;
                }
            }
        } else {
            for _ in current..target {
                self.spawn(rng, arena)?;
            }
        }
        Ok(())
    }

    /// Count down the two-stage death; finished slots are parked and reusable
    pub fn finish_deaths(&mut self) {
        for p in &mut self.particles {
            if let SecondaryState::JustDied(stage) = p.state {
                match stage.advance() {
                    Some(next) => p.state = SecondaryState::JustDied(next),
                    None => {
                        p.state = SecondaryState::Inactive;
                        p.body.pos = self.park;
                        p.body.vel = Vec2::ZERO;
                    }
                }
            }
        }
    }

    /// Move spawning particles toward their goals; arrivals start moving freely
    pub fn advance_spawning<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let duration = self.species.spawn_duration;
        for p in &mut self.particles {
            let SecondaryState::Spawning { progress, goal } = p.state else {
                continue;
            };
            if progress >= duration {
                p.state = SecondaryState::Free;
                p.body.vel = random_velocity(rng, self.species.speed);
            } else {
                let progress = progress + 1;
                let t = progress as f32 / duration as f32;
                p.state = SecondaryState::Spawning { progress, goal };
                p.body.pos = self.park.lerp(goal, t);
            }
        }
    }

    pub fn step_motion<R: Rng + ?Sized>(&mut self, rng: &mut R, arena: &Arena) -> usize {
        let members = self.free_members();
        motion::step(
            rng,
            &mut self.particles,
            &members,
            arena,
            &self.species,
            |_, _| false,
        )
    }

    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for p in &self.particles {
            match p.state {
                SecondaryState::Inactive => counts.inactive += 1,
                SecondaryState::Spawning { .. } => counts.spawning += 1,
                SecondaryState::Free => counts.free += 1,
                SecondaryState::JustDied(_) => counts.just_died += 1,
            }
        }
        counts
    }
}
