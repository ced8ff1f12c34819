//! Property tests: structural invariants hold every frame under arbitrary
//! command sequences.

use proptest::prelude::*;

use sos_sim::sim::{PrimaryState, SiteId};
use sos_sim::{Command, Model, Parameter, Settings, Simulation};

fn model() -> impl Strategy<Value = Model> {
    prop_oneof![
        Just(Model::A),
        Just(Model::B),
        Just(Model::C),
        Just(Model::D)
    ]
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => model().prop_map(Command::SelectModel),
        1 => (0.0..10.0f64).prop_map(|v| Command::SetParameter(Parameter::Disintegration, v)),
        1 => (0.0..150.0f64).prop_map(|v| Command::SetParameter(Parameter::Production, v)),
        1 => (0.0..0.5f64).prop_map(|v| Command::SetParameter(Parameter::PseudoK, v)),
        1 => (0.0..0.5f64).prop_map(|v| Command::SetParameter(Parameter::PlasmidPseudoK(1), v)),
        1 => (-1.0..4.0f64).prop_map(|v| Command::SetParameter(Parameter::DnaDamage, v)),
        1 => (0.0..80.0f64).prop_map(|v| Command::SetParameter(Parameter::SecondaryAmount, v)),
        1 => (0.0..50.0f64).prop_map(|v| Command::SetParameter(Parameter::SecondaryProduction, v)),
        1 => Just(Command::Pause),
        1 => Just(Command::Resume),
    ]
}

/// A command (or nothing) before each frame
fn schedule() -> impl Strategy<Value = Vec<Option<Command>>> {
    prop::collection::vec(prop::option::weighted(0.1, command()), 50..150)
}

fn small_settings(seed: u64) -> Settings {
    let mut settings = Settings::with_seed(seed);
    settings.primary.capacity = 120;
    settings.secondary.capacity = 60;
    settings.activation_window = 100;
    settings.history_length = 50;
    settings
}

fn check_invariants(sim: &Simulation) -> Result<(), TestCaseError> {
    let settings = sim.settings();

    // Every slot is in exactly one state
    prop_assert_eq!(sim.primary().state_counts().total(), settings.primary.capacity);
    prop_assert_eq!(
        sim.secondary().state_counts().total(),
        settings.secondary.capacity
    );

    // Roaming set is exactly the free particles
    let free = sim.primary().particles().iter().filter(|p| p.is_free()).count();
    prop_assert_eq!(sim.primary().amount(), free);

    // Occupancy agrees in both directions
    for site in sim.sites().iter() {
        if let Some(id) = site.occupant() {
            prop_assert_eq!(
                sim.primary().particles()[id].state,
                PrimaryState::Bound { site: site.id }
            );
        }
    }
    for p in sim.primary().particles() {
        if let Some(site) = p.bound_site() {
            prop_assert_eq!(sim.sites().get(site).occupant(), Some(p.id));
        }
    }
    for id in SiteId::PLASMIDS {
        if sim.model() != Model::D {
            prop_assert!(!sim.sites().get(id).occupied());
        }
    }

    prop_assert!((0.0..1.0).contains(&sim.rounding_error()));
    for window in sim.activation() {
        prop_assert!(window.active_count() <= window.len());
    }
    prop_assert!(sim.damage() >= 0.0);
    prop_assert!(sim.damage() <= settings.dna_damage_bounds.max);
    Ok(())
}

fn run(seed: u64, schedule: &[Option<Command>]) -> Simulation {
    let mut sim = Simulation::new(small_settings(seed)).unwrap();
    for command in schedule.iter().flatten() {
        sim.submit(*command).unwrap();
        sim.tick();
    }
    sim
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn invariants_hold_every_frame(seed in any::<u64>(), schedule in schedule()) {
        let mut sim = Simulation::new(small_settings(seed)).unwrap();
        sim.submit(Command::SetParameter(Parameter::Production, 100.0)).unwrap();
        for step in &schedule {
            if let Some(command) = step {
                sim.submit(*command).unwrap();
            }
            sim.tick();
            check_invariants(&sim)?;
        }
    }

    #[test]
    fn same_seed_same_run(seed in any::<u64>(), schedule in schedule()) {
        let a = serde_json::to_string(&run(seed, &schedule).snapshot()).unwrap();
        let b = serde_json::to_string(&run(seed, &schedule).snapshot()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn model_round_trip_restores_secondary(
        seed in any::<u64>(),
        amount in 0usize..60,
        via in model(),
        wait in 0usize..4,
    ) {
        let mut sim = Simulation::new(small_settings(seed)).unwrap();
        sim.select_model(Model::C);
        sim.submit(Command::SetParameter(Parameter::SecondaryAmount, amount as f64)).unwrap();
        sim.tick();
        prop_assert_eq!(sim.secondary().amount(), amount);

        sim.select_model(Model::A);
        for _ in 0..wait {
            sim.tick();
        }
        sim.select_model(via);
        sim.select_model(Model::C);
        sim.tick();
        prop_assert_eq!(sim.secondary().amount(), amount);
    }
}

#[test]
fn paused_ticks_do_not_advance() {
    let mut sim = Simulation::new(small_settings(3)).unwrap();
    sim.pause();
    for _ in 0..10 {
        assert!(!sim.tick());
    }
    assert_eq!(sim.frame(), 0);
    sim.resume();
    assert!(sim.tick());
    assert_eq!(sim.frame(), 1);
}
