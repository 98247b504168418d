use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;
use tip_core::catalog::Catalog;
use tip_core::collect_chronicle;
use tip_core::driver::Controller;
use tip_core::frame::make_frame;

/// Hard cap when `--ticks` is omitted and the run never reaches terminal.
const DEFAULT_TICK_CAP: u64 = 2_000;

#[derive(Parser, Debug)]
#[command(name = "tipstep", about = "Batch runner for tipping-cascade NDJSON frames")]
struct Args {
    /// Scenario id from the catalog.
    #[arg(long)]
    scenario: String,

    /// Path to a catalog JSON document (defaults to the builtin catalog).
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Number of ticks to execute (defaults to running until every element
    /// has tipped).
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed phrase for the random source; omitted means entropy.
    #[arg(long, value_name = "PHRASE")]
    seed: Option<String>,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,

    /// Optional path to emit cascade events as NDJSON.
    #[arg(long = "emit-events", value_name = "PATH")]
    emit_events: Option<PathBuf>,
}

fn make_rng(seed: &Option<String>) -> ChaCha8Rng {
    match seed {
        Some(phrase) => Seeder::from(phrase.as_str()).make_rng(),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let catalog = match &args.catalog {
        Some(path) => Catalog::load_from_path(path)
            .with_context(|| format!("failed to load catalog from {:?}", path))?,
        None => Catalog::builtin(),
    };

    let mut rng = make_rng(&args.seed);
    let mut controller = Controller::new(catalog);
    controller.select_scenario(&args.scenario, &mut rng)?;

    let frame_file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut frame_writer = BufWriter::new(frame_file);

    let mut event_writer = if let Some(path) = &args.emit_events {
        let file = File::create(path)
            .with_context(|| format!("failed to create events file at {:?}", path))?;
        Some(BufWriter::new(file))
    } else {
        None
    };

    let cap = args.ticks.unwrap_or(DEFAULT_TICK_CAP);
    let mut t: u64 = 0;
    while t < cap {
        let Some(diff) = controller.tick(&mut rng)? else {
            break;
        };
        t += 1;

        if let Some(writer) = event_writer.as_mut() {
            for event in &diff.events {
                let line = serde_json::to_string(event)?;
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
        }

        let chronicle = collect_chronicle(controller.catalog(), &diff);
        let frame = make_frame(t, controller.run(), controller.catalog(), chronicle);
        frame_writer.write_all(frame.to_ndjson()?.as_bytes())?;

        if diff.terminal {
            break;
        }
    }

    frame_writer.flush()?;
    if let Some(writer) = event_writer.as_mut() {
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{make_rng, Args};
    use clap::{error::ErrorKind, Parser};
    use tip_core::catalog::Catalog;
    use tip_core::driver::Controller;
    use tip_core::frame::make_frame;

    #[test]
    fn requires_scenario_and_out() {
        let err = Args::try_parse_from(["tipstep", "--out", "frames.ndjson"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Args::try_parse_from(["tipstep", "--scenario", "high"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn paired_seeded_runs_are_deterministic() {
        let run_once = || {
            let mut rng = make_rng(&Some("wet equator".to_string()));
            let mut controller = Controller::new(Catalog::builtin());
            controller
                .select_scenario("surge", &mut rng)
                .expect("scenario exists");
            let mut lines = Vec::new();
            for t in 1..=300u64 {
                let Some(diff) = controller.tick(&mut rng).expect("tick succeeds") else {
                    break;
                };
                let frame = make_frame(t, controller.run(), controller.catalog(), Vec::new());
                lines.push(frame.to_ndjson().expect("frame serializes"));
                if diff.terminal {
                    break;
                }
            }
            lines
        };

        let first = run_once();
        let second = run_once();
        assert_eq!(first, second);
    }
}
