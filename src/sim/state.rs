//! Simulation context and command handling
//!
//! `Simulation` owns every piece of mutable state, including the single RNG
//! stream. Commands are queued and applied at the next frame boundary, never
//! mid-frame.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::activation::{ActivationWindow, prefill_windows};
use super::geometry::Geometry;
use super::kinetics::{Disintegration, ProductionTimer};
use super::model::{Effect, Model, transition_effects};
use super::particle::Species;
use super::pool::{PrimaryPool, SecondaryPool};
use super::repair::DamageState;
use super::secondary::SecondaryIntegrator;
use super::sites::{SiteId, SiteRegistry};
use super::tick::step_frame;
use crate::consts::PLASMID_COUNT;
use crate::error::SimError;
use crate::settings::{Parameter, Settings};
use crate::snapshot::Snapshot;

/// Input from the operator, applied between frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetParameter(Parameter, f64),
    SelectModel(Model),
    Pause,
    Resume,
}

/// Non-fatal conditions surfaced to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimEvent {
    /// A spawn was skipped because the pool had no free slot
    ResourceExhausted { species: Species },
}

pub struct Simulation {
    pub(crate) settings: Settings,
    pub(crate) geometry: Geometry,
    pub(crate) rng: Pcg32,
    pub(crate) frame: u64,
    pub(crate) model: Model,
    pub(crate) paused: bool,

    pub(crate) primary: PrimaryPool,
    pub(crate) secondary: SecondaryPool,
    pub(crate) sites: SiteRegistry,

    pub(crate) disintegration: Disintegration,
    pub(crate) production: ProductionTimer,
    pub(crate) integrator: SecondaryIntegrator,
    pub(crate) activation: [ActivationWindow; PLASMID_COUNT],
    pub(crate) damage: DamageState,

    /// RecA count to restore when C or D is entered again
    pub(crate) remembered_secondary: usize,
    pub(crate) primary_history: VecDeque<usize>,

    events: Vec<SimEvent>,
    pending: VecDeque<Command>,
}

impl Simulation {
    /// Fresh simulation in model A with no particles
    pub fn new(settings: Settings) -> Result<Self, SimError> {
        settings.validate()?;

        let geometry = Geometry::new(&settings);
        let sites = SiteRegistry::new(&geometry, &settings);
        let primary = PrimaryPool::new(&settings.primary, geometry.primary_spawn);
        let secondary = SecondaryPool::new(&settings.secondary, geometry.secondary_spawn);
        let window = settings.activation_window;

        log::info!(
            "Simulation initialized with seed {} ({}x{} arena)",
            settings.seed,
            settings.arena_width,
            settings.arena_height
        );

        Ok(Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            frame: 0,
            model: Model::A,
            paused: false,
            primary,
            secondary,
            sites,
            disintegration: Disintegration::default(),
            production: ProductionTimer::new(settings.production_rate),
            integrator: SecondaryIntegrator::default(),
            activation: std::array::from_fn(|_| ActivationWindow::new(window)),
            damage: DamageState::new(
                settings.dna_damage,
                settings.dna_damage_bounds.max,
                settings.history_length,
            ),
            remembered_secondary: settings.default_secondary_amount as usize,
            primary_history: VecDeque::from(vec![0; settings.history_length]),
            events: Vec::new(),
            pending: VecDeque::new(),
            geometry,
            settings,
        })
    }

    // === Commands ===

    /// Queue a command for the next frame boundary
    pub fn submit(&mut self, command: Command) -> Result<(), SimError> {
        if let Command::SetParameter(param, value) = command {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter {
                    name: param.to_string(),
                    value,
                });
            }
        }
        self.pending.push_back(command);
        Ok(())
    }

    /// Queue a parameter change by name. Out-of-range values are clamped when
    /// applied.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        let param: Parameter = name.parse()?;
        self.submit(Command::SetParameter(param, value))
    }

    pub fn select_model(&mut self, model: Model) {
        self.pending.push_back(Command::SelectModel(model));
    }

    pub fn pause(&mut self) {
        self.pending.push_back(Command::Pause);
    }

    pub fn resume(&mut self) {
        self.pending.push_back(Command::Resume);
    }

    /// Apply queued commands, then advance one frame unless paused.
    /// Returns whether a frame was simulated.
    pub fn tick(&mut self) -> bool {
        while let Some(command) = self.pending.pop_front() {
            self.apply(command);
        }
        if self.paused {
            return false;
        }
        step_frame(self);
        true
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetParameter(param, value) => self.apply_parameter(param, value),
            Command::SelectModel(model) => self.switch_model(model),
            Command::Pause => {
                if !self.paused {
                    log::info!("Paused at frame {}", self.frame);
                }
                self.paused = true;
            }
            Command::Resume => {
                if self.paused {
                    log::info!("Resumed at frame {}", self.frame);
                }
                self.paused = false;
            }
        }
    }

    fn apply_parameter(&mut self, param: Parameter, value: f64) {
        let value = param.clamp(value, &self.settings);
        log::debug!("{} <- {}", param, value);

        match param {
            Parameter::TickInterval => self.settings.tick_interval_ms = value,
            Parameter::Disintegration => self.settings.disintegration_rate = value,
            Parameter::Production => {
                self.settings.production_rate = value;
                self.production.set_rate(value);
            }
            Parameter::PseudoK => {
                self.settings.pseudo_k = value;
                self.sites.set_pseudo_k(SiteId::Primary, value);
            }
            Parameter::PlasmidPseudoK(n) => {
                self.settings.plasmid_pseudo_k[n] = value;
                self.sites.set_pseudo_k(SiteId::PLASMIDS[n], value);
            }
            Parameter::DnaDamage => {
                self.settings.dna_damage = value;
                self.damage.set(value);
            }
            Parameter::SecondaryProduction => self.settings.secondary_production_rate = value,
            Parameter::SecondaryDisintegration => {
                self.settings.secondary_disintegration_rate = value
            }
            Parameter::SecondaryAmount => self.set_secondary_amount(value.round() as usize),
            Parameter::Transcription => self.settings.transcription = value != 0.0,
        }
    }

    /// Operator override of the RecA count
    fn set_secondary_amount(&mut self, amount: usize) {
        if self.model.has_secondary() {
            self.set_secondary_target(amount);
            if self.model.has_plasmids() {
                self.integrator.reset(amount);
            }
        } else {
            self.remembered_secondary = amount;
        }
    }

    pub(crate) fn set_secondary_target(&mut self, target: usize) {
        let arena = self.geometry.arena;
        if let Err(e) = self.secondary.set_target(&mut self.rng, &arena, target) {
            self.report(e);
        }
    }

    // === Model controller ===

    fn switch_model(&mut self, to: Model) {
        let from = self.model;
        let effects = transition_effects(from, to);
        if effects.is_empty() {
            return;
        }
        for effect in effects {
            self.apply_effect(effect);
        }
        self.model = to;
        log::info!("Model {} -> {}: {}", from, to, to.description());
    }

    fn apply_effect(&mut self, effect: Effect) {
        log::debug!("Applying {:?}", effect);
        match effect {
            Effect::EnablePrimarySite => self.sites.set_enabled(SiteId::Primary, true),
            Effect::DisablePrimarySite => {
                self.force_release(SiteId::Primary);
                self.sites.set_enabled(SiteId::Primary, false);
            }
            Effect::DrainSecondary => {
                self.remembered_secondary = self.secondary.amount();
                self.set_secondary_target(0);
            }
            Effect::RestoreSecondary => self.set_secondary_target(self.remembered_secondary),
            Effect::SeedAccumulator => self.integrator.reset(self.secondary.amount()),
            Effect::DisablePlasmids => {
                for id in SiteId::PLASMIDS {
                    self.force_release(id);
                    self.sites.set_enabled(id, false);
                }
            }
            Effect::ResetPlasmids => {
                for id in SiteId::PLASMIDS {
                    self.force_release(id);
                    self.sites.set_enabled(id, true);
                }
                self.activation = prefill_windows(
                    &mut self.rng,
                    self.settings.activation_window,
                    &self.settings.plasmid_pseudo_k,
                );
            }
        }
    }

    /// Release a site's occupant (if any) back into circulation
    pub(crate) fn force_release(&mut self, id: SiteId) {
        if let Some(particle) = self.sites.force_release(id) {
            self.primary
                .release(&mut self.rng, particle, self.settings.rebind_refractory);
        }
    }

    pub(crate) fn release_due(&mut self, id: SiteId) {
        if let Some(particle) = self.sites.tick_release(id) {
            self.primary
                .release(&mut self.rng, particle, self.settings.rebind_refractory);
        }
    }

    /// Surface a non-fatal error: log it and record an event
    pub(crate) fn report(&mut self, error: SimError) {
        log::warn!("Frame {}: {}", self.frame, error);
        if let SimError::ResourceExhausted(species) = error {
            self.events.push(SimEvent::ResourceExhausted { species });
        }
    }

    // === Queries ===

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn primary(&self) -> &PrimaryPool {
        &self.primary
    }

    pub fn secondary(&self) -> &SecondaryPool {
        &self.secondary
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    pub fn rounding_error(&self) -> f64 {
        self.disintegration.rounding_error
    }

    pub fn damage(&self) -> f64 {
        self.damage.value()
    }

    pub fn activation(&self) -> &[ActivationWindow; PLASMID_COUNT] {
        &self.activation
    }

    pub fn activation_ratios(&self) -> [f64; PLASMID_COUNT] {
        std::array::from_fn(|i| self.activation[i].ratio())
    }

    /// RecA count held while in model A or B
    pub fn remembered_secondary(&self) -> usize {
        self.remembered_secondary
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Take every event recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
