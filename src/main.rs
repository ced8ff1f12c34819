//! SOS Sim headless runner
//!
//! Runs the simulation for a number of frames and prints the final snapshot
//! as JSON. Rendering front-ends drive `Simulation` directly instead.
//!
//! Usage: `sos-sim [--settings FILE] [--model A|B|C|D] [--frames N] [--damage X] [--realtime]`

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use std::time::Duration;

    use sos_sim::{Model, Settings, SimError, Simulation};

    struct Args {
        settings: Option<String>,
        model: Model,
        frames: u64,
        damage: Option<f64>,
        realtime: bool,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            settings: None,
            model: Model::A,
            frames: 1000,
            damage: None,
            realtime: false,
        };
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            let mut value = |flag: &str| it.next().ok_or_else(|| format!("{} needs a value", flag));
            match arg.as_str() {
                "--settings" => args.settings = Some(value("--settings")?),
                "--model" => {
                    args.model = value("--model")?
                        .parse::<Model>()
                        .map_err(|e: SimError| e.to_string())?
                }
                "--frames" => {
                    args.frames = value("--frames")?
                        .parse::<u64>()
                        .map_err(|e| format!("--frames: {}", e))?
                }
                "--damage" => {
                    args.damage = Some(
                        value("--damage")?
                            .parse::<f64>()
                            .map_err(|e| format!("--damage: {}", e))?,
                    )
                }
                "--realtime" => args.realtime = true,
                other => return Err(format!("unknown argument `{}`", other)),
            }
        }
        Ok(args)
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let args = parse_args()?;
        let settings = match &args.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let mut sim = Simulation::new(settings)?;
        sim.select_model(args.model);
        if let Some(damage) = args.damage {
            sim.set_parameter("dna_damage", damage)?;
        }

        log::info!("Running {} frames in model {}", args.frames, args.model);
        let report_every = (args.frames / 10).max(1);
        for _ in 0..args.frames {
            sim.tick();
            for event in sim.drain_events() {
                log::warn!("{:?}", event);
            }
            if sim.frame() % report_every == 0 {
                let ratios = sim.activation_ratios();
                log::info!(
                    "frame {:>6}  LexA {:>4}  RecA {:>4}  damage {:.4}  activation {:.2}/{:.2}/{:.2}",
                    sim.frame(),
                    sim.primary().amount(),
                    sim.secondary().amount(),
                    sim.damage(),
                    ratios[0],
                    ratios[1],
                    ratios[2]
                );
            }
            if args.realtime {
                std::thread::sleep(Duration::from_secs_f64(
                    sim.settings().tick_interval_ms / 1000.0,
                ));
            }
        }

        println!("{}", sim.snapshot().to_json()?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("SOS Sim (headless) starting...");
    if let Err(e) = runner::run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web front-ends embed the library directly
}
