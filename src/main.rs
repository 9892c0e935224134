use std::fs;
use std::path::PathBuf;
use std::process;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use smpsim::prelude::*;

#[derive(Debug, Error)]
enum DriverError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bad configuration file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sim(#[from] SimError),
}

#[derive(Debug)]
struct Options {
    config: Option<PathBuf>,
    seed: u64,
    max_steps: u64,
    instructions: usize,
    json: bool,
    show: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: None,
            seed: 1,
            max_steps: 1000,
            instructions: 8,
            json: false,
            show: false,
        }
    }
}

fn print_help() {
    println!("smpsim - self-modifying programs on a grid\n");
    println!("Usage: smpsim [options]\n");
    println!("Options:");
    println!("  --config <file.json>   Configuration (default: 64x64, 4 data bits, 3 memory bits, 100 individuals)");
    println!("  --seed <n>             Seed for instructions and initial cells (default: 1)");
    println!("  --steps <n>            Step budget (default: 1000)");
    println!("  --instructions <n>     Size of the random instruction set (default: 8)");
    println!("  --json                 Print the run summary as JSON");
    println!("  --show                 Print the final state (2D grids only)");
    println!("  -h, --help             Show this help");
    println!("\nLogging is controlled by RUST_LOG (e.g. RUST_LOG=smpsim=debug).");
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, DriverError> {
    let value = value.ok_or_else(|| DriverError::Usage(format!("{flag} needs a value")))?;
    value
        .parse()
        .map_err(|_| DriverError::Usage(format!("invalid value for {flag}: {value}")))
}

fn parse_args() -> Result<Option<Options>, DriverError> {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => return Ok(None),
            "--config" => opts.config = Some(parse_value(&arg, args.next())?),
            "--seed" => opts.seed = parse_value(&arg, args.next())?,
            "--steps" => opts.max_steps = parse_value(&arg, args.next())?,
            "--instructions" => opts.instructions = parse_value(&arg, args.next())?,
            "--json" => opts.json = true,
            "--show" => opts.show = true,
            other => return Err(DriverError::Usage(format!("unknown argument: {other}"))),
        }
    }
    Ok(Some(opts))
}

fn load_configuration(path: Option<&PathBuf>) -> Result<Configuration, DriverError> {
    let Some(path) = path else {
        return Ok(Configuration::default());
    };
    let text = fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Cells are shaded by value, occupied cells show their head count.
fn render(state: &State) -> Result<String, DriverError> {
    const SHADES: &[u8] = b" .:-=+*#%";
    let view = PlaneView::new(state)?;
    let levels = view.levels()?;
    let mut out = String::with_capacity((view.width() + 1) * view.height());
    for y in 0..view.height() {
        for x in 0..view.width() {
            let occupants = view.occupants(x, y);
            let c = match occupants {
                0 => {
                    let value = view.cell_value(x, y)?;
                    let shade = (value as f64 / levels as f64 * SHADES.len() as f64) as usize;
                    SHADES[shade.min(SHADES.len() - 1)] as char
                }
                1..=9 => char::from(b'0' + occupants as u8),
                _ => '@',
            };
            out.push(c);
        }
        out.push('\n');
    }
    Ok(out)
}

fn run(opts: Options) -> Result<(), DriverError> {
    let configuration = load_configuration(opts.config.as_ref())?;
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let instructions = Instruction::random_set(&configuration, opts.instructions, &mut rng)?;
    for (i, instruction) in instructions.iter().enumerate() {
        tracing::debug!(index = i, "{}", instruction);
    }
    let environment = Environment::new(configuration, instructions)?;
    let mut state = environment.initial_state(|width| random_bits(width, &mut rng))?;
    info!(
        extent = %environment.configuration().extent,
        seed = opts.seed,
        max_steps = opts.max_steps,
        "starting run"
    );

    let mut stats = RunStats::new();
    while !state.is_extinct() && state.step() <= opts.max_steps {
        stats.observe(&state);
        state = environment.step(&state)?;
    }
    stats.observe(&state);
    let summary = stats.summary();
    info!(
        final_step = summary.final_step,
        extinct = summary.extinct,
        "run finished"
    );

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("final k = {}", summary.final_step);
        println!("max pop size = {}", summary.max_population);
        println!("avg pop size = {:.1}", summary.avg_population);
    }
    if opts.show {
        print!("{}", render(&state)?);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = match parse_args() {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            print_help();
            return;
        }
        Err(e) => {
            eprintln!("{e}");
            print_help();
            process::exit(2);
        }
    };

    if let Err(e) = run(opts) {
        error!("{}", e);
        eprintln!("error: {e}");
        process::exit(1);
    }
}
