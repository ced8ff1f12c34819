//! Read-only per-frame view of the simulation
//!
//! Renderers and charts only ever see a `Snapshot`; nothing in here can
//! mutate the core. `instances()` flattens the particles into a plain-old-data
//! array ready for a GPU instance buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::Serialize;

use crate::consts::PLASMID_COUNT;
use crate::error::SimError;
use crate::sim::{
    Model, PrimaryState, Rect, SecondaryState, SiteId, Simulation, Species, StateCounts,
};

/// Display status of an active particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticleStatus {
    Spawning,
    Free,
    Bound,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleView {
    pub id: usize,
    pub species: Species,
    pub position: Vec2,
    pub radius: f32,
    pub status: ParticleStatus,
    /// Frames into the spawn animation, while spawning
    pub spawn_progress: Option<u32>,
    pub bound_site: Option<SiteId>,
    /// 0..1, fades in during the spawn animation
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub id: SiteId,
    pub enabled: bool,
    pub occupied: bool,
    pub occupant: Option<usize>,
    pub unbind_countdown: u32,
    pub hitbox: Rect,
    pub binding_point: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    pub model: Model,
    pub description: &'static str,
    pub paused: bool,

    pub primary: Vec<ParticleView>,
    pub secondary: Vec<ParticleView>,
    pub sites: Vec<SiteView>,

    /// Free roaming LexA
    pub primary_amount: usize,
    /// Free plus spawning RecA
    pub secondary_amount: usize,
    pub primary_states: StateCounts,
    pub secondary_states: StateCounts,

    /// Frames until the next production attempt, `None` while production is off
    pub production_countdown: Option<u32>,

    pub damage: f64,
    pub activation_ratios: [f64; PLASMID_COUNT],

    pub primary_history: Vec<usize>,
    pub repair_histories: [Vec<f64>; PLASMID_COUNT],
}

/// One particle as a GPU instance
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub opacity: f32,
}

fn fade(progress: u32, duration: u32) -> f32 {
    if duration == 0 {
        1.0
    } else {
        (progress as f32 / duration as f32).min(1.0)
    }
}

impl Snapshot {
    pub fn capture(sim: &Simulation) -> Self {
        let settings = sim.settings();

        let primary = sim
            .primary()
            .particles()
            .iter()
            .filter_map(|p| {
                let (status, spawn_progress) = match p.state {
                    PrimaryState::Spawning { progress } => {
                        (ParticleStatus::Spawning, Some(progress))
                    }
                    PrimaryState::Free => (ParticleStatus::Free, None),
                    PrimaryState::Bound { .. } => (ParticleStatus::Bound, None),
                    PrimaryState::Inactive | PrimaryState::JustDied(_) => return None,
                };
                Some(ParticleView {
                    id: p.id,
                    species: Species::Primary,
                    position: p.body.pos,
                    radius: p.body.radius,
                    status,
                    spawn_progress,
                    bound_site: p.bound_site(),
                    opacity: spawn_progress
                        .map_or(1.0, |n| fade(n, settings.primary.spawn_duration)),
                })
            })
            .collect();

        let secondary = sim
            .secondary()
            .particles()
            .iter()
            .filter_map(|p| {
                let (status, spawn_progress) = match p.state {
                    SecondaryState::Spawning { progress, .. } => {
                        (ParticleStatus::Spawning, Some(progress))
                    }
                    SecondaryState::Free => (ParticleStatus::Free, None),
                    SecondaryState::Inactive | SecondaryState::JustDied(_) => return None,
                };
                Some(ParticleView {
                    id: p.id,
                    species: Species::Secondary,
                    position: p.body.pos,
                    radius: p.body.radius,
                    status,
                    spawn_progress,
                    bound_site: None,
                    opacity: spawn_progress
                        .map_or(1.0, |n| fade(n, settings.secondary.spawn_duration)),
                })
            })
            .collect();

        let sites = sim
            .sites()
            .iter()
            .map(|s| SiteView {
                id: s.id,
                enabled: s.enabled,
                occupied: s.occupied(),
                occupant: s.occupant(),
                unbind_countdown: s.unbind_countdown,
                hitbox: s.hitbox,
                binding_point: s.binding_point,
            })
            .collect();

        Self {
            frame: sim.frame(),
            model: sim.model(),
            description: sim.model().description(),
            paused: sim.is_paused(),
            primary,
            secondary,
            sites,
            primary_amount: sim.primary().amount(),
            secondary_amount: sim.secondary().amount(),
            primary_states: sim.primary().state_counts(),
            secondary_states: sim.secondary().state_counts(),
            production_countdown: sim
                .production
                .cooldown()
                .map(|_| sim.production.remaining()),
            damage: sim.damage(),
            activation_ratios: sim.activation_ratios(),
            primary_history: sim.primary_history.iter().copied().collect(),
            repair_histories: std::array::from_fn(|i| {
                sim.damage.histories()[i].iter().copied().collect()
            }),
        }
    }

    /// Every visible particle (LexA first) as instance data
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.primary
            .iter()
            .chain(&self.secondary)
            .map(|p| ParticleInstance {
                position: p.position.to_array(),
                radius: p.radius,
                opacity: p.opacity,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Raw bytes of an instance array, for uploading to a vertex buffer
pub fn instance_bytes(instances: &[ParticleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_snapshot_lists_active_particles_only() {
        let mut sim = Simulation::new(Settings::with_seed(5)).unwrap();
        for _ in 0..12 {
            sim.tick();
        }
        // Spawns on frames 5 and 10; the first has finished its animation
        let snap = sim.snapshot();
        assert_eq!(snap.frame, 12);
        assert_eq!(snap.primary.len(), 2);
        assert_eq!(snap.primary_states.total(), 1500);
        assert!(snap.secondary.is_empty());
        assert_eq!(snap.sites.len(), 4);
        assert_eq!(snap.primary_history.len(), 1000);
        assert_eq!(snap.repair_histories[0].len(), 1000);
        // beta = 20: next attempt on frame 15
        assert_eq!(snap.production_countdown, Some(3));
    }

    #[test]
    fn test_snapshot_hides_countdown_when_production_off() {
        let mut sim = Simulation::new(Settings::with_seed(8)).unwrap();
        sim.set_parameter("beta", 0.0).unwrap();
        sim.tick();
        assert_eq!(sim.snapshot().production_countdown, None);
    }

    #[test]
    fn test_instances_match_views() {
        let mut sim = Simulation::new(Settings::with_seed(6)).unwrap();
        sim.select_model(Model::C);
        for _ in 0..3 {
            sim.tick();
        }
        let snap = sim.snapshot();
        let instances = snap.instances();
        assert_eq!(instances.len(), snap.primary.len() + snap.secondary.len());
        // Freshly spawned RecA is still fading in
        assert!(instances.iter().all(|i| i.opacity <= 1.0));
        assert!(instances.iter().any(|i| i.opacity < 1.0));

        let bytes = instance_bytes(&instances);
        assert_eq!(bytes.len(), instances.len() * 16);
    }

    #[test]
    fn test_snapshot_serializes() {
        let sim = Simulation::new(Settings::with_seed(7)).unwrap();
        let json = sim.snapshot().to_json().unwrap();
        assert!(json.contains("\"model\": \"A\""));
    }
}
