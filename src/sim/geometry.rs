//! Arena layout: chromosome strand, plasmid rings and their operons
//!
//! Everything is derived from the arena size. The chromosome strand is
//! centred; the three plasmids sit at the top centre and the two lower
//! quarters. Hitboxes are open rectangles (a point on the edge is outside).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::motion::Arena;
use crate::consts::*;
use crate::settings::Settings;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Strict containment
    pub fn contains(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Operon arc on top of a plasmid ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmidOperon {
    /// Ring centre
    pub center: Vec2,
    pub radius: f32,
    /// Angular width of the operon (radians)
    pub arc: f32,
}

impl PlasmidOperon {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            radius: PLASMID_RADIUS,
            arc: PLASMID_OPERON_ANGLE,
        }
    }

    /// Arc length of the operon
    #[inline]
    pub fn length(&self) -> f32 {
        self.radius * self.arc
    }

    /// Where a captured particle sits: the top of the ring
    pub fn binding_point(&self) -> Vec2 {
        Vec2::new(self.center.x, self.center.y - self.radius)
    }

    /// The arc flattened to a strand-thick rectangle around the binding point
    pub fn hitbox(&self) -> Rect {
        let half = Vec2::new(self.length() / 2.0, DNA_HEIGHT / 2.0);
        let p = self.binding_point();
        Rect::new(p - half, p + half)
    }
}

/// Fixed layout for one arena size
#[derive(Debug, Clone)]
pub struct Geometry {
    pub arena: Arena,
    /// Top-left corner of the chromosome strand
    pub dna_origin: Vec2,
    pub operon_hitbox: Rect,
    pub operon_binding_point: Vec2,
    /// Where new LexA appears (and dead LexA is parked)
    pub primary_spawn: Vec2,
    /// Where a spawning LexA leaves the strand
    pub primary_release: Vec2,
    pub plasmids: [PlasmidOperon; PLASMID_COUNT],
    /// Where new RecA appears (and dead RecA is parked)
    pub secondary_spawn: Vec2,
}

impl Geometry {
    pub fn new(settings: &Settings) -> Self {
        let (w, h) = (settings.arena_width, settings.arena_height);
        let arena = Arena::new(w, h, settings.out_of_bounds);

        let dna_origin = Vec2::new(w / 2.0 - DNA_LENGTH / 2.0, h / 2.0 - DNA_HEIGHT / 2.0);
        let strand_mid_y = dna_origin.y + DNA_HEIGHT / 2.0;

        let operon_min = Vec2::new(dna_origin.x + OPERON_OFFSET, dna_origin.y);
        let operon_hitbox = Rect::new(
            operon_min,
            operon_min + Vec2::new(OPERON_LENGTH, DNA_HEIGHT),
        );

        Self {
            arena,
            dna_origin,
            operon_hitbox,
            operon_binding_point: operon_hitbox.center(),
            primary_spawn: Vec2::new(
                dna_origin.x + OPERON_OFFSET + OPERON_LENGTH + SPAWN_GAP,
                strand_mid_y,
            ),
            primary_release: Vec2::new(dna_origin.x + DNA_LENGTH - RELEASE_INSET, strand_mid_y),
            plasmids: [
                PlasmidOperon::new(Vec2::new(w / 2.0, h / 4.0)),
                PlasmidOperon::new(Vec2::new(w / 4.0, h * 3.0 / 4.0)),
                PlasmidOperon::new(Vec2::new(w * 3.0 / 4.0, h * 3.0 / 4.0)),
            ],
            secondary_spawn: Vec2::new(w / 2.0, 0.0),
        }
    }

    /// Position of a spawning LexA `progress` frames into a `duration`-frame animation
    pub fn primary_spawn_position(&self, progress: u32, duration: u32) -> Vec2 {
        let t = if duration == 0 {
            1.0
        } else {
            (progress as f32 / duration as f32).min(1.0)
        };
        self.primary_spawn.lerp(self.primary_release, t)
    }
}
