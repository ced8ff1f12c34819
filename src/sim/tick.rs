//! Fixed-order frame pipeline
//!
//! Advances the simulation by one frame. Every subsystem runs synchronously
//! in the same order every frame, drawing from the one RNG stream.

use super::sites::SiteId;
use super::state::Simulation;

/// Advance one frame. Queued commands must already be applied.
pub fn step_frame(sim: &mut Simulation) {
    let model = sim.model;

    // Deaths from last frame free their slots
    sim.primary.finish_deaths();

    if model.has_secondary() {
        let killed = cross_degradation(sim);
        if killed > 0 {
            log::debug!("Frame {}: RecA degraded {} LexA", sim.frame, killed);
        }
    }

    // Natural degradation
    let to_kill = sim
        .disintegration
        .kills_this_frame(sim.primary.amount(), sim.settings.disintegration_rate);
    sim.primary.kill_random(&mut sim.rng, to_kill);

    sim.primary.tick_refractory();
    sim.primary.advance_spawning(&mut sim.rng, &sim.geometry);

    let captures = sim
        .primary
        .step_motion(&mut sim.rng, &sim.geometry.arena, &mut sim.sites);
    for (particle, site) in captures {
        log::debug!("Frame {}: LexA {} bound {:?}", sim.frame, particle, site);
    }

    // Chromosome operon: transcribe while free, count down while bound
    if sim.sites.get(SiteId::Primary).occupied() {
        sim.release_due(SiteId::Primary);
    } else if sim.settings.transcription && sim.production.tick() {
        if let Err(e) = sim.primary.spawn() {
            sim.report(e);
        }
    }

    for id in SiteId::PLASMIDS {
        sim.release_due(id);
    }

    // Slots drained by a model switch still count down outside C and D
    sim.secondary.finish_deaths();
    if model.has_secondary() {
        sim.secondary.advance_spawning(&mut sim.rng);
        sim.secondary.step_motion(&mut sim.rng, &sim.geometry.arena);
    }

    if model.has_plasmids() {
        sos_response(sim);
    }

    sim.primary_history.push_back(sim.primary.amount());
    sim.primary_history.pop_front();
    sim.frame += 1;
}

/// Kill each free LexA touching a free RecA. Returns how many died.
fn cross_degradation(sim: &mut Simulation) -> usize {
    let reach = sim.settings.primary.radius + sim.settings.secondary.radius;
    let effectors: Vec<_> = sim
        .secondary
        .particles()
        .iter()
        .filter(|p| p.is_free())
        .map(|p| p.body.pos)
        .collect();
    if effectors.is_empty() {
        return 0;
    }

    let particles = sim.primary.particles();
    let victims: Vec<usize> = sim
        .primary
        .roaming()
        .iter()
        .copied()
        .filter(|&i| {
            let pos = particles[i].body.pos;
            effectors.iter().any(|e| e.distance(pos) < reach)
        })
        .collect();

    for &id in &victims {
        sim.primary.kill(id);
    }
    victims.len()
}

/// RecA tracking damage, plasmid expression, and the repair it drives
fn sos_response(sim: &mut Simulation) {
    let target = sim.integrator.step(
        sim.settings.secondary_disintegration_rate,
        sim.settings.secondary_production_rate,
        sim.damage.value(),
    );
    if target != sim.secondary.amount() {
        sim.set_secondary_target(target);
    }

    for (window, id) in sim.activation.iter_mut().zip(SiteId::PLASMIDS) {
        window.record(!sim.sites.get(id).occupied());
    }

    let ratios = sim.activation_ratios();
    let repaired = sim
        .damage
        .repair(ratios, &sim.settings.repair_tables, sim.settings.repair_weight);
    log::trace!(
        "Frame {}: ratios {:?}, repair {:?}, damage {:.6}",
        sim.frame,
        ratios,
        repaired,
        sim.damage.value()
    );
}
