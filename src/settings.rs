//! Simulation settings and runtime parameters
//!
//! `Settings` holds every tunable value. All of them can be loaded from a JSON
//! file, and the ones exposed to the input layer (`Parameter`) carry declared
//! `Bounds` so out-of-range requests get clamped before they reach the core.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{PLASMID_COUNT, REPAIR_BUCKETS};
use crate::error::SimError;

/// Closed `[min, max]` range for a runtime-adjustable parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Nearest in-range value
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Per-species particle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSettings {
    /// Number of preallocated slots
    pub capacity: usize,
    /// Fixed speed magnitude (pixels per frame)
    pub speed: f32,
    /// Brownian kick weight (0 = pure collision model)
    pub randomness: f32,
    pub radius: f32,
    /// Length of the spawn animation, in frames
    pub spawn_duration: u32,
}

impl SpeciesSettings {
    /// LexA defaults
    pub fn repressor() -> Self {
        Self {
            capacity: 1500,
            speed: 5.0,
            randomness: 1.0,
            radius: 4.0,
            spawn_duration: 5,
        }
    }

    /// RecA defaults
    pub fn effector() -> Self {
        Self {
            capacity: 1000,
            speed: 3.0,
            randomness: 1.5,
            radius: 5.25,
            spawn_duration: 20,
        }
    }
}

/// All simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed; identical seeds and commands give identical runs
    pub seed: u64,

    // === Pacing ===
    /// Wall-clock time between frames (ms). Never affects outcomes.
    pub tick_interval_ms: f64,
    pub tick_interval_bounds: Bounds,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Distance from the arena border where particles bounce
    pub out_of_bounds: f32,

    // === Species ===
    pub primary: SpeciesSettings,
    pub secondary: SpeciesSettings,
    /// Frames a released LexA must wait before binding again
    pub rebind_refractory: u32,
    /// RecA count used the first time model C or D is entered
    pub default_secondary_amount: u32,

    // === LexA kinetics ===
    /// Gates transcription at the LexA operon
    pub transcription: bool,
    /// Alpha, % of free LexA degraded per frame
    pub disintegration_rate: f64,
    pub disintegration_bounds: Bounds,
    /// Beta, units per 100 frames
    pub production_rate: f64,
    pub production_bounds: Bounds,
    /// Pseudo-k at the chromosome operon
    pub pseudo_k: f64,
    /// Pseudo-k at each plasmid operon
    pub plasmid_pseudo_k: [f64; PLASMID_COUNT],
    /// Shared by the chromosome and plasmid pseudo-k values
    pub pseudo_k_bounds: Bounds,

    // === RecA / damage ===
    /// Initial DNA damage
    pub dna_damage: f64,
    pub dna_damage_bounds: Bounds,
    /// Gamma, RecA production per unit damage (per 100 frames)
    pub secondary_production_rate: f64,
    pub secondary_production_bounds: Bounds,
    /// Delta, % of RecA degraded per frame
    pub secondary_disintegration_rate: f64,
    pub secondary_disintegration_bounds: Bounds,

    // === SOS plasmid expression ===
    /// Trailing window length (frames) for activation ratios
    pub activation_window: usize,
    pub repair_weight: f64,
    /// Repair magnitude per activation bucket, ascending, one table per plasmid
    pub repair_tables: [[f64; REPAIR_BUCKETS]; PLASMID_COUNT],

    // === Charts ===
    pub history_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED_1E7A,

            tick_interval_ms: 50.0,
            tick_interval_bounds: Bounds::new(1.0, 1000.0),

            arena_width: 800.0,
            arena_height: 600.0,
            out_of_bounds: 10.0,

            primary: SpeciesSettings::repressor(),
            secondary: SpeciesSettings::effector(),
            rebind_refractory: 10,
            default_secondary_amount: 10,

            transcription: true,
            disintegration_rate: 0.2,
            disintegration_bounds: Bounds::new(0.0, 100.0),
            production_rate: 20.0,
            production_bounds: Bounds::new(0.0, 100.0),
            pseudo_k: 0.02,
            plasmid_pseudo_k: [0.2, 0.01, 0.005],
            pseudo_k_bounds: Bounds::new(0.001, 10.0),

            dna_damage: 0.0,
            dna_damage_bounds: Bounds::new(0.0, 3.0),
            secondary_production_rate: 20.0,
            secondary_production_bounds: Bounds::new(0.0, 100.0),
            secondary_disintegration_rate: 0.2,
            secondary_disintegration_bounds: Bounds::new(0.0, 100.0),

            activation_window: 1000,
            repair_weight: 0.000_001,
            repair_tables: [
                [0.0, 0.0, 0.0, 0.0, 2.0, 5.0, 7.0, 10.0, 15.0, 25.0],
                [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 40.0, 80.0, 150.0],
                [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 500.0, 700.0],
            ],

            history_length: 1000,
        }
    }
}

impl Settings {
    /// Defaults with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Load settings from a JSON file (missing fields take their defaults)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject settings the core cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |msg: String| Err(SimError::InvalidSettings(msg));

        if self.primary.capacity == 0 || self.secondary.capacity == 0 {
            return invalid("pool capacities must be positive".into());
        }
        if self.arena_width <= 2.0 * self.out_of_bounds
            || self.arena_height <= 2.0 * self.out_of_bounds
        {
            return invalid(format!(
                "arena {}x{} is too small for an out-of-bounds margin of {}",
                self.arena_width, self.arena_height, self.out_of_bounds
            ));
        }
        if self.activation_window == 0 {
            return invalid("activation_window must be positive".into());
        }
        if self.history_length == 0 {
            return invalid("history_length must be positive".into());
        }
        if self.repair_weight < 0.0 {
            return invalid("repair_weight must not be negative".into());
        }
        for (i, table) in self.repair_tables.iter().enumerate() {
            if table.windows(2).any(|w| w[1] < w[0]) {
                return invalid(format!("repair table {} must be ascending", i));
            }
        }

        let checks = [
            ("tick_interval_ms", self.tick_interval_ms, self.tick_interval_bounds),
            ("disintegration_rate", self.disintegration_rate, self.disintegration_bounds),
            ("production_rate", self.production_rate, self.production_bounds),
            ("pseudo_k", self.pseudo_k, self.pseudo_k_bounds),
            ("dna_damage", self.dna_damage, self.dna_damage_bounds),
            (
                "secondary_production_rate",
                self.secondary_production_rate,
                self.secondary_production_bounds,
            ),
            (
                "secondary_disintegration_rate",
                self.secondary_disintegration_rate,
                self.secondary_disintegration_bounds,
            ),
        ];
        for (name, value, bounds) in checks {
            if !bounds.contains(value) {
                return invalid(format!(
                    "{} = {} outside [{}, {}]",
                    name, value, bounds.min, bounds.max
                ));
            }
        }
        for (i, &k) in self.plasmid_pseudo_k.iter().enumerate() {
            if !self.pseudo_k_bounds.contains(k) {
                return invalid(format!("plasmid_pseudo_k[{}] = {} out of bounds", i, k));
            }
        }

        Ok(())
    }
}

/// A runtime-adjustable parameter, as named by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    TickInterval,
    /// Alpha
    Disintegration,
    /// Beta
    Production,
    /// Chromosome operon pseudo-k
    PseudoK,
    /// Pseudo-k of plasmid `n` (0-based)
    PlasmidPseudoK(usize),
    DnaDamage,
    /// Gamma
    SecondaryProduction,
    /// Delta
    SecondaryDisintegration,
    /// Operator-set RecA count
    SecondaryAmount,
    /// 0 = off, anything else = on
    Transcription,
}

impl Parameter {
    /// Declared range for this parameter
    pub fn bounds(&self, settings: &Settings) -> Bounds {
        match self {
            Parameter::TickInterval => settings.tick_interval_bounds,
            Parameter::Disintegration => settings.disintegration_bounds,
            Parameter::Production => settings.production_bounds,
            Parameter::PseudoK | Parameter::PlasmidPseudoK(_) => settings.pseudo_k_bounds,
            Parameter::DnaDamage => settings.dna_damage_bounds,
            Parameter::SecondaryProduction => settings.secondary_production_bounds,
            Parameter::SecondaryDisintegration => settings.secondary_disintegration_bounds,
            Parameter::SecondaryAmount => Bounds::new(0.0, settings.secondary.capacity as f64),
            Parameter::Transcription => Bounds::new(0.0, 1.0),
        }
    }

    /// Clamp a requested value to the declared range, warning when it moves
    pub fn clamp(&self, value: f64, settings: &Settings) -> f64 {
        let bounds = self.bounds(settings);
        let clamped = bounds.clamp(value);
        if clamped != value {
            log::warn!(
                "{} = {} outside [{}, {}], clamped to {}",
                self,
                value,
                bounds.min,
                bounds.max,
                clamped
            );
        }
        clamped
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::TickInterval => write!(f, "tick_interval"),
            Parameter::Disintegration => write!(f, "alpha"),
            Parameter::Production => write!(f, "beta"),
            Parameter::PseudoK => write!(f, "k"),
            Parameter::PlasmidPseudoK(i) => write!(f, "plasmid_k_{}", i),
            Parameter::DnaDamage => write!(f, "dna_damage"),
            Parameter::SecondaryProduction => write!(f, "gamma"),
            Parameter::SecondaryDisintegration => write!(f, "delta"),
            Parameter::SecondaryAmount => write!(f, "secondary_amount"),
            Parameter::Transcription => write!(f, "transcription"),
        }
    }
}

impl FromStr for Parameter {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let param = match name.as_str() {
            "tick_interval" | "delta_t" => Parameter::TickInterval,
            "alpha" | "disintegration_rate" => Parameter::Disintegration,
            "beta" | "production_rate" => Parameter::Production,
            "k" | "pseudo_k" => Parameter::PseudoK,
            "dna_damage" | "damage" => Parameter::DnaDamage,
            "gamma" | "secondary_production_rate" => Parameter::SecondaryProduction,
            "delta" | "secondary_disintegration_rate" => Parameter::SecondaryDisintegration,
            "secondary_amount" | "reca" => Parameter::SecondaryAmount,
            "transcription" => Parameter::Transcription,
            other => {
                let index = other
                    .strip_prefix("plasmid_k_")
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|&n| n < PLASMID_COUNT);
                match index {
                    Some(n) => Parameter::PlasmidPseudoK(n),
                    None => return Err(SimError::UnknownParameter(s.to_string())),
                }
            }
        };
        Ok(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_parameter_names_round_trip() {
        for p in [
            Parameter::TickInterval,
            Parameter::Disintegration,
            Parameter::Production,
            Parameter::PseudoK,
            Parameter::PlasmidPseudoK(2),
            Parameter::DnaDamage,
            Parameter::SecondaryProduction,
            Parameter::SecondaryDisintegration,
            Parameter::SecondaryAmount,
            Parameter::Transcription,
        ] {
            assert_eq!(p.to_string().parse::<Parameter>().unwrap(), p);
        }
        assert_eq!("Beta".parse::<Parameter>().unwrap(), Parameter::Production);
        assert!("plasmid_k_3".parse::<Parameter>().is_err());
        assert!("omega".parse::<Parameter>().is_err());
    }

    #[test]
    fn test_clamp_to_declared_bounds() {
        let settings = Settings::default();
        assert_eq!(Parameter::Production.clamp(250.0, &settings), 100.0);
        assert_eq!(Parameter::PseudoK.clamp(0.0, &settings), 0.001);
        assert_eq!(Parameter::DnaDamage.clamp(1.5, &settings), 1.5);
        assert_eq!(Parameter::SecondaryAmount.clamp(5000.0, &settings), 1000.0);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut settings = Settings::default();
        settings.activation_window = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.repair_tables[1][3] = 99.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pseudo_k = 50.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "seed": 42, "production_rate": 50.0 }"#)
            .expect("valid json");
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.production_rate, 50.0);
        assert_eq!(settings.activation_window, 1000);
        assert_eq!(settings.primary.capacity, 1500);
    }
}
