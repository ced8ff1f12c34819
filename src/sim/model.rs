//! Model complexity levels and the side effects of switching between them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Model complexity, from plain production/degradation up to the full SOS loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    A,
    B,
    C,
    D,
}

impl Model {
    pub const ALL: [Model; 4] = [Model::A, Model::B, Model::C, Model::D];

    /// LexA binds its own operon
    pub fn has_operon(self) -> bool {
        self != Model::A
    }

    /// RecA is simulated
    pub fn has_secondary(self) -> bool {
        matches!(self, Model::C | Model::D)
    }

    /// Plasmid sites, activation tracking and repair
    pub fn has_plasmids(self) -> bool {
        self == Model::D
    }

    /// One-line summary for the UI
    pub fn description(self) -> &'static str {
        match self {
            Model::A => "LexA is produced at a constant rate and degrades at a constant rate",
            Model::B => {
                "LexA represses its own production by binding to its operon (negative autoregulation)"
            }
            Model::C => "RecA, induced by DNA damage, degrades free LexA on contact",
            Model::D => {
                "LexA also binds three SOS plasmids whose expression repairs DNA damage over time"
            }
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Model::A => "A",
            Model::B => "B",
            Model::C => "C",
            Model::D => "D",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Model {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Model::A),
            "B" => Ok(Model::B),
            "C" => Ok(Model::C),
            "D" => Ok(Model::D),
            _ => Err(SimError::UnknownModel(s.to_string())),
        }
    }
}

/// A single side effect of a model switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    EnablePrimarySite,
    /// Force-release any occupant, then disable
    DisablePrimarySite,
    /// Remember the current RecA count, then remove every RecA particle
    DrainSecondary,
    /// Spawn RecA up to the remembered count
    RestoreSecondary,
    /// Seed the RecA accumulator from the discrete count
    SeedAccumulator,
    /// Force-release and disable every plasmid site
    DisablePlasmids,
    /// Force-release, re-enable and re-prefill every plasmid site
    ResetPlasmids,
}

/// Effects of switching `from` -> `to`, in the order they must be applied.
/// Staying on the same model has no effects.
pub fn transition_effects(from: Model, to: Model) -> Vec<Effect> {
    let mut effects = Vec::new();
    if from == to {
        return effects;
    }

    if !from.has_operon() && to.has_operon() {
        effects.push(Effect::EnablePrimarySite);
    }
    if from.has_operon() && !to.has_operon() {
        effects.push(Effect::DisablePrimarySite);
    }
    if from.has_secondary() && !to.has_secondary() {
        effects.push(Effect::DrainSecondary);
    }
    if !from.has_secondary() && to.has_secondary() {
        effects.push(Effect::RestoreSecondary);
    }
    if to.has_plasmids() {
        effects.push(Effect::SeedAccumulator);
        effects.push(Effect::ResetPlasmids);
    }
    if from.has_plasmids() {
        effects.push(Effect::DisablePlasmids);
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use Effect::*;

    #[test]
    fn test_parse_model() {
        assert_eq!("a".parse::<Model>().unwrap(), Model::A);
        assert_eq!(" D ".parse::<Model>().unwrap(), Model::D);
        assert!("E".parse::<Model>().is_err());
        for m in Model::ALL {
            assert_eq!(m.to_string().parse::<Model>().unwrap(), m);
        }
    }

    #[test]
    fn test_self_transition_is_noop() {
        for m in Model::ALL {
            assert!(transition_effects(m, m).is_empty());
        }
    }

    #[test]
    fn test_transition_table() {
        assert_eq!(transition_effects(Model::A, Model::B), vec![EnablePrimarySite]);
        assert_eq!(
            transition_effects(Model::A, Model::C),
            vec![EnablePrimarySite, RestoreSecondary]
        );
        assert_eq!(
            transition_effects(Model::A, Model::D),
            vec![EnablePrimarySite, RestoreSecondary, SeedAccumulator, ResetPlasmids]
        );
        assert_eq!(
            transition_effects(Model::C, Model::D),
            vec![SeedAccumulator, ResetPlasmids]
        );
        assert_eq!(transition_effects(Model::D, Model::C), vec![DisablePlasmids]);
        assert_eq!(
            transition_effects(Model::D, Model::A),
            vec![DisablePrimarySite, DrainSecondary, DisablePlasmids]
        );
        assert_eq!(transition_effects(Model::C, Model::B), vec![DrainSecondary]);
        assert_eq!(transition_effects(Model::B, Model::A), vec![DisablePrimarySite]);
    }
}
