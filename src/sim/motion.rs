//! Motion engine: integration, wall bounces, pairwise collisions, Brownian kicks
//!
//! Collisions are magnitude-preserving rather than momentum-conserving: every
//! particle of a species moves at the same fixed speed, so after exchanging
//! normal velocity components both results are rescaled back to that speed.

use glam::Vec2;
use rand::Rng;

use super::particle::{Body, HasBody};
use crate::normalize_speed;
use crate::settings::SpeciesSettings;

/// Rectangular arena with a bounce margin on every side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Point the velocity back inside when the body has crossed a margin
    pub fn reflect(&self, body: &mut Body) {
        if body.pos.x < self.margin {
            body.vel.x = body.vel.x.abs();
        } else if body.pos.x > self.width - self.margin {
            body.vel.x = -body.vel.x.abs();
        }
        if body.pos.y < self.margin {
            body.vel.y = body.vel.y.abs();
        } else if body.pos.y > self.height - self.margin {
            body.vel.y = -body.vel.y.abs();
        }
    }

    /// Uniform random point inside the margins
    pub fn random_interior<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let x = self.margin + rng.random::<f32>() * (self.width - 2.0 * self.margin);
        let y = self.margin + rng.random::<f32>() * (self.height - 2.0 * self.margin);
        Vec2::new(x, y)
    }
}

/// Result of a pair overlap check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the first body toward the second
    pub normal: Vec2,
    /// How far the bodies overlap (0 when just touching)
    pub penetration: f32,
}

/// Overlap test between two bodies; touching counts as contact
pub fn contact(a: &Body, b: &Body) -> Option<Contact> {
    let delta = b.pos - a.pos;
    let distance = delta.length();
    let reach = a.radius + b.radius;
    if distance > reach {
        return None;
    }
    // Coincident centres have no defined normal; pick one
    let normal = if distance > 0.0 { delta / distance } else { Vec2::X };
    Some(Contact {
        normal,
        penetration: reach - distance,
    })
}

/// Exchange the normal velocity components, restore the species speed and
/// push the bodies apart along the normal
pub fn resolve<R: Rng + ?Sized>(
    rng: &mut R,
    a: &mut Body,
    b: &mut Body,
    contact: Contact,
    speed: f32,
) {
    let n = contact.normal;
    let t = n.perp();

    // Into the collision frame
    let (a_n, a_t) = (a.vel.dot(n), a.vel.dot(t));
    let (b_n, b_t) = (b.vel.dot(n), b.vel.dot(t));

    // Swap normal components, then back to world space
    a.vel = normalize_speed(rng, n * b_n + t * a_t, speed);
    b.vel = normalize_speed(rng, n * a_n + t * b_t, speed);

    let push = n * (contact.penetration * 0.5);
    a.pos -= push;
    b.pos += push;
}

/// Random perturbation for particles that did not collide this frame
pub fn brownian_kick<R: Rng + ?Sized>(rng: &mut R, vel: Vec2, weight: f32, speed: f32) -> Vec2 {
    let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5);
    normalize_speed(rng, vel + jitter * weight * speed, speed)
}

/// Two distinct mutable elements of a slice
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// Resolve every touching unordered pair among `members` (slot indices).
///
/// Returns a per-slot flag marking which particles collided.
pub fn collide_group<T: HasBody, R: Rng + ?Sized>(
    rng: &mut R,
    particles: &mut [T],
    members: &[usize],
    speed: f32,
) -> Vec<bool> {
    let mut collided = vec![false; particles.len()];
    for (n, &i) in members.iter().enumerate() {
        for &j in &members[n + 1..] {
            let (a, b) = pair_mut(particles, i, j);
            if let Some(c) = contact(a.body(), b.body()) {
                resolve(rng, a.body_mut(), b.body_mut(), c, speed);
                collided[i] = true;
                collided[j] = true;
            }
        }
    }
    collided
}

/// Advance one species by a frame.
///
/// Each member moves by its velocity, then `captured` is asked whether the
/// particle was taken out of circulation (operon capture). Captured particles
/// skip the rest of the frame. The others bounce off the arena margins,
/// collide pairwise, and get a Brownian kick if they did not collide.
///
/// Returns the number of particles that collided.
pub fn step<T, R, F>(
    rng: &mut R,
    particles: &mut [T],
    members: &[usize],
    arena: &Arena,
    species: &SpeciesSettings,
    mut captured: F,
) -> usize
where
    T: HasBody,
    R: Rng + ?Sized,
    F: FnMut(usize, &mut T) -> bool,
{
    let mut moving = Vec::with_capacity(members.len());
    for &i in members {
        let particle = &mut particles[i];
        let body = particle.body_mut();
        body.pos += body.vel;
        if captured(i, particle) {
            continue;
        }
        arena.reflect(particle.body_mut());
        moving.push(i);
    }

    let collided = collide_group(rng, particles, &moving, species.speed);

    let mut collisions = 0;
    for &i in &moving {
        if collided[i] {
            collisions += 1;
            continue;
        }
        let body = particles[i].body_mut();
        body.vel = brownian_kick(rng, body.vel, species.randomness, species.speed);
    }
    collisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Dot(Body);

    impl HasBody for Dot {
        fn body(&self) -> &Body {
            &self.0
        }
        fn body_mut(&mut self) -> &mut Body {
            &mut self.0
        }
    }

    fn body(x: f32, y: f32, vx: f32, vy: f32) -> Body {
        Body {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            radius: 4.0,
        }
    }

    #[test]
    fn test_head_on_collision_preserves_speed() {
        let mut rng = Pcg32::seed_from_u64(1);
        // Exactly 2r apart, approaching at speed 5
        let mut a = body(100.0, 100.0, 5.0, 0.0);
        let mut b = body(108.0, 100.0, -5.0, 0.0);

        let c = contact(&a, &b).expect("touching bodies collide");
        assert_eq!(c.penetration, 0.0);
        resolve(&mut rng, &mut a, &mut b, c, 5.0);

        assert!((a.vel.length() - 5.0).abs() < 1e-4);
        assert!((b.vel.length() - 5.0).abs() < 1e-4);
        assert!(a.vel.x < 0.0);
        assert!(b.vel.x > 0.0);
    }

    #[test]
    fn test_no_contact_beyond_reach() {
        let a = body(100.0, 100.0, 5.0, 0.0);
        let b = body(108.1, 100.0, -5.0, 0.0);
        assert!(contact(&a, &b).is_none());
    }

    #[test]
    fn test_overlap_is_separated() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut a = body(100.0, 100.0, 0.0, 5.0);
        let mut b = body(104.0, 100.0, 0.0, -5.0);
        let c = contact(&a, &b).expect("overlapping");
        assert!((c.penetration - 4.0).abs() < 1e-5);
        resolve(&mut rng, &mut a, &mut b, c, 5.0);
        assert!(((b.pos - a.pos).length() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_wall_reflection() {
        let arena = Arena::new(800.0, 600.0, 10.0);
        let mut b = body(9.0, 300.0, -5.0, 0.0);
        arena.reflect(&mut b);
        assert_eq!(b.vel, Vec2::new(5.0, 0.0));

        let mut b = body(400.0, 595.0, 0.0, 3.0);
        arena.reflect(&mut b);
        assert_eq!(b.vel, Vec2::new(0.0, -3.0));

        // Still moving inward: nothing to do
        let mut b = body(9.0, 300.0, 5.0, 0.0);
        arena.reflect(&mut b);
        assert_eq!(b.vel, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_brownian_kick_keeps_speed() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut v = Vec2::new(3.0, 0.0);
        for _ in 0..100 {
            v = brownian_kick(&mut rng, v, 1.5, 3.0);
            assert!((v.length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_step_collision_and_kick_are_exclusive() {
        let mut rng = Pcg32::seed_from_u64(4);
        let arena = Arena::new(800.0, 600.0, 10.0);
        let species = SpeciesSettings::repressor();
        let mut dots = vec![
            Dot(body(100.0, 100.0, 5.0, 0.0)),
            Dot(body(118.0, 100.0, -5.0, 0.0)),
            Dot(body(400.0, 400.0, 0.0, 5.0)),
        ];
        let collisions = step(&mut rng, &mut dots, &[0, 1, 2], &arena, &species, |_, _| false);
        assert_eq!(collisions, 2);
        // The pair bounced straight back; the loner was kicked but kept its speed
        assert_eq!(dots[0].0.vel, Vec2::new(-5.0, 0.0));
        assert_eq!(dots[1].0.vel, Vec2::new(5.0, 0.0));
        assert!((dots[2].0.vel.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_step_skips_captured() {
        let mut rng = Pcg32::seed_from_u64(5);
        let arena = Arena::new(800.0, 600.0, 10.0);
        let species = SpeciesSettings::repressor();
        let mut dots = vec![
            Dot(body(100.0, 100.0, 5.0, 0.0)),
            Dot(body(118.0, 100.0, -5.0, 0.0)),
        ];
        let collisions = step(&mut rng, &mut dots, &[0, 1], &arena, &species, |i, d| {
            if i == 0 {
                d.body_mut().vel = Vec2::ZERO;
                true
            } else {
                false
            }
        });
        assert_eq!(collisions, 0);
        assert_eq!(dots[0].0.pos, Vec2::new(105.0, 100.0));
        assert_eq!(dots[0].0.vel, Vec2::ZERO);
    }
}
