//! Binding sites and the operon capture protocol
//!
//! A site holds at most one LexA. The occupant id is the only occupancy
//! record, so "occupied" and "occupant" cannot disagree. Sites are checked in
//! a fixed priority order and a particle binds at most one site per frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Geometry, Rect};
use super::kinetics::unbind_ttl;
use super::particle::{PrimaryParticle, PrimaryState};
use crate::consts::PLASMID_COUNT;
use crate::settings::Settings;

/// Binding site identifier, in capture priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteId {
    /// The LexA operon on the chromosome
    Primary,
    Plasmid0,
    Plasmid1,
    Plasmid2,
}

impl SiteId {
    pub const ALL: [SiteId; 4] = [
        SiteId::Primary,
        SiteId::Plasmid0,
        SiteId::Plasmid1,
        SiteId::Plasmid2,
    ];

    pub const PLASMIDS: [SiteId; PLASMID_COUNT] =
        [SiteId::Plasmid0, SiteId::Plasmid1, SiteId::Plasmid2];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One operon a LexA particle can occupy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingSite {
    pub id: SiteId,
    pub hitbox: Rect,
    pub binding_point: Vec2,
    /// Whether the current model uses this site
    pub enabled: bool,
    occupant: Option<usize>,
    /// Frames left before the occupant is released
    pub unbind_countdown: u32,
    /// Bound duration from the site's pseudo-k; 0 disables binding
    pub unbind_ttl: u32,
}

impl BindingSite {
    fn new(id: SiteId, hitbox: Rect, binding_point: Vec2, k: f64) -> Self {
        Self {
            id,
            hitbox,
            binding_point,
            enabled: false,
            occupant: None,
            unbind_countdown: 0,
            unbind_ttl: unbind_ttl(k),
        }
    }

    #[inline]
    pub fn occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<usize> {
        self.occupant
    }

    /// Whether a particle at `pos` with `rebind_in` frames of refractory left
    /// may bind here
    pub fn accepts(&self, pos: Vec2, rebind_in: u32) -> bool {
        self.enabled
            && !self.occupied()
            && self.unbind_ttl > 0
            && rebind_in == 0
            && self.hitbox.contains(pos)
    }
}

/// All binding sites, indexed by `SiteId`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRegistry {
    sites: [BindingSite; 4],
}

impl SiteRegistry {
    /// Sites for the given layout, all disabled
    pub fn new(geometry: &Geometry, settings: &Settings) -> Self {
        let plasmid = |n: usize| {
            let operon = &geometry.plasmids[n];
            BindingSite::new(
                SiteId::PLASMIDS[n],
                operon.hitbox(),
                operon.binding_point(),
                settings.plasmid_pseudo_k[n],
            )
        };
        Self {
            sites: [
                BindingSite::new(
                    SiteId::Primary,
                    geometry.operon_hitbox,
                    geometry.operon_binding_point,
                    settings.pseudo_k,
                ),
                plasmid(0),
                plasmid(1),
                plasmid(2),
            ],
        }
    }

    pub fn get(&self, id: SiteId) -> &BindingSite {
        &self.sites[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BindingSite> {
        self.sites.iter()
    }

    pub fn set_enabled(&mut self, id: SiteId, enabled: bool) {
        self.sites[id.index()].enabled = enabled;
    }

    /// Recompute a site's bound duration after its pseudo-k changed.
    /// A particle already bound keeps its current countdown.
    pub fn set_pseudo_k(&mut self, id: SiteId, k: f64) {
        let site = &mut self.sites[id.index()];
        site.unbind_ttl = unbind_ttl(k);
        log::debug!("{:?} unbind ttl now {} frames", id, site.unbind_ttl);
    }

    /// Bind `particle` to the first site that accepts it.
    ///
    /// On capture the particle snaps to the binding point, stops, and becomes
    /// `Bound`; the caller removes it from the roaming set.
    pub fn try_capture(&mut self, particle: &mut PrimaryParticle) -> Option<SiteId> {
        let pos = particle.body.pos;
        let id = self
            .sites
            .iter()
            .find(|s| s.accepts(pos, particle.rebind_in))
            .map(|s| s.id)?;
        if !self.occupy(id, particle.id) {
            return None;
        }

        particle.state = PrimaryState::Bound { site: id };
        particle.body.pos = self.get(id).binding_point;
        particle.body.vel = Vec2::ZERO;
        Some(id)
    }

    /// Directly occupy a site. Attempting to occupy an occupied site is a
    /// programming error: it is reported and the occupancy is left unchanged.
    pub fn occupy(&mut self, id: SiteId, particle: usize) -> bool {
        let site = &mut self.sites[id.index()];
        if let Some(current) = site.occupant {
            debug_assert!(
                false,
                "{:?} already holds particle {}, refusing {}",
                id, current, particle
            );
            log::error!(
                "Invariant violation: {:?} already holds particle {}, refusing {}",
                id,
                current,
                particle
            );
            return false;
        }
        site.occupant = Some(particle);
        site.unbind_countdown = site.unbind_ttl;
        true
    }

    /// Count down an occupied site. Returns the occupant once its time is up.
    pub fn tick_release(&mut self, id: SiteId) -> Option<usize> {
        let site = &mut self.sites[id.index()];
        site.occupant?;
        if site.unbind_countdown == 0 {
            site.occupant.take()
        } else {
            site.unbind_countdown -= 1;
            None
        }
    }

    /// Release the occupant immediately (model switch)
    pub fn force_release(&mut self, id: SiteId) -> Option<usize> {
        self.sites[id.index()].unbind_countdown = 0;
        self.tick_release(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (SiteRegistry, Geometry) {
        let settings = Settings::default();
        let geometry = Geometry::new(&settings);
        (SiteRegistry::new(&geometry, &settings), geometry)
    }

    fn particle_at(id: usize, pos: Vec2) -> PrimaryParticle {
        let mut p = PrimaryParticle::new(id, Vec2::ZERO, 4.0);
        p.state = PrimaryState::Free;
        p.body.pos = pos;
        p.body.vel = Vec2::new(5.0, 0.0);
        p
    }

    #[test]
    fn test_site_order_and_indices() {
        for (i, id) in SiteId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_capture_snaps_and_stops() {
        let (mut sites, g) = registry();
        sites.set_enabled(SiteId::Primary, true);
        let mut p = particle_at(7, Vec2::new(340.0, 299.0));

        assert_eq!(sites.try_capture(&mut p), Some(SiteId::Primary));
        assert_eq!(p.state, PrimaryState::Bound { site: SiteId::Primary });
        assert_eq!(p.body.pos, g.operon_binding_point);
        assert_eq!(p.body.vel, Vec2::ZERO);

        let site = sites.get(SiteId::Primary);
        assert_eq!(site.occupant(), Some(7));
        assert_eq!(site.unbind_countdown, 50);
    }

    #[test]
    fn test_capture_eligibility() {
        let (mut sites, _) = registry();
        let inside = Vec2::new(340.0, 299.0);

        // Disabled
        let mut p = particle_at(0, inside);
        assert_eq!(sites.try_capture(&mut p), None);

        // Refractory
        sites.set_enabled(SiteId::Primary, true);
        p.rebind_in = 3;
        assert_eq!(sites.try_capture(&mut p), None);

        // Outside the hitbox
        let mut q = particle_at(1, Vec2::new(320.0, 299.0));
        assert_eq!(sites.try_capture(&mut q), None);

        // Zero ttl disables binding
        sites.set_pseudo_k(SiteId::Primary, 10.0);
        let mut r = particle_at(2, inside);
        assert_eq!(sites.try_capture(&mut r), None);
    }

    #[test]
    fn test_single_occupancy() {
        let (mut sites, _) = registry();
        sites.set_enabled(SiteId::Primary, true);
        let mut a = particle_at(0, Vec2::new(340.0, 299.0));
        let mut b = particle_at(1, Vec2::new(341.0, 299.0));
        assert!(sites.try_capture(&mut a).is_some());
        assert_eq!(sites.try_capture(&mut b), None);
        assert!(b.is_free());
        assert_eq!(sites.get(SiteId::Primary).occupant(), Some(0));
    }

    #[test]
    #[should_panic(expected = "already holds")]
    fn test_double_occupancy_is_loud() {
        let (mut sites, _) = registry();
        assert!(sites.occupy(SiteId::Plasmid0, 1));
        sites.occupy(SiteId::Plasmid0, 2);
    }

    #[test]
    fn test_release_after_ttl() {
        let (mut sites, _) = registry();
        sites.set_enabled(SiteId::Primary, true);
        let mut p = particle_at(4, Vec2::new(340.0, 299.0));
        sites.try_capture(&mut p);

        // Countdown runs on the capture frame too, so release lands 50 frames later
        let released_on = (0..=50).find(|_| sites.tick_release(SiteId::Primary).is_some());
        assert_eq!(released_on, Some(50));
        assert!(!sites.get(SiteId::Primary).occupied());
    }

    #[test]
    fn test_force_release() {
        let (mut sites, _) = registry();
        assert!(sites.occupy(SiteId::Plasmid1, 9));
        assert_eq!(sites.force_release(SiteId::Plasmid1), Some(9));
        assert_eq!(sites.force_release(SiteId::Plasmid1), None);
    }
}
