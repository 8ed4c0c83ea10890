//! Command-line runner: loads a grid description and prints a snapshot after
//! every tick in which a movement was attempted.
//!
//! ```text
//! cellflow input.txt --ticks 1000 --p-type "FIXED(32,16)" --v-type DOUBLE
//! ```
//!
//! Set `RUST_LOG=debug` for per-tick diagnostics on stderr.

use std::fmt;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use cellflow::{FastFixed, Fixed, Number, SimConfig, SimInput, Simulator, TextSink};
use clap::Parser;

/// Numeric types selectable for each simulated quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NumberKind {
    Float,
    Double,
    Fixed32,
    Fixed64,
    FastFixed32,
}

impl NumberKind {
    const ALL: [NumberKind; 5] = [
        NumberKind::Float,
        NumberKind::Double,
        NumberKind::Fixed32,
        NumberKind::Fixed64,
        NumberKind::FastFixed32,
    ];

    fn name(self) -> &'static str {
        match self {
            NumberKind::Float => "FLOAT",
            NumberKind::Double => "DOUBLE",
            NumberKind::Fixed32 => "FIXED(32,16)",
            NumberKind::Fixed64 => "FIXED(64,32)",
            NumberKind::FastFixed32 => "FAST_FIXED(32,16)",
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumberKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                format!("unsupported type {s:?}, expected one of: {}", names.join(", "))
            })
    }
}

#[derive(Parser, Debug)]
#[command(name = "cellflow")]
#[command(about = "Cellular incompressible fluid simulation on a walled grid", long_about = None)]
struct Args {
    /// Grid description file
    #[arg(default_value = "input.txt")]
    input: PathBuf,

    /// Pressure number type
    #[arg(long, default_value_t = NumberKind::FastFixed32)]
    p_type: NumberKind,

    /// Velocity number type
    #[arg(long, default_value_t = NumberKind::FastFixed32)]
    v_type: NumberKind,

    /// Achieved-flow number type
    #[arg(long, default_value_t = NumberKind::FastFixed32)]
    v_flow_type: NumberKind,

    /// Ticks to simulate
    #[arg(long, default_value_t = 1_000_000)]
    ticks: usize,

    /// Random seed
    #[arg(long, default_value_t = 1337)]
    seed: u64,
}

/// Binds `$alias` to the concrete type for `$kind` and evaluates `$body`.
macro_rules! with_number {
    ($kind:expr, $alias:ident, $body:block) => {
        match $kind {
            NumberKind::Float => {
                type $alias = f32;
                $body
            }
            NumberKind::Double => {
                type $alias = f64;
                $body
            }
            NumberKind::Fixed32 => {
                type $alias = Fixed<32, 16>;
                $body
            }
            NumberKind::Fixed64 => {
                type $alias = Fixed<64, 32>;
                $body
            }
            NumberKind::FastFixed32 => {
                type $alias = FastFixed<32, 16>;
                $body
            }
        }
    };
}

fn simulate<P: Number, V: Number, F: Number>(
    input: &SimInput,
    config: &SimConfig,
) -> cellflow::Result<()> {
    log::info!(
        "number types: p={} v={} flow={}",
        std::any::type_name::<P>(),
        std::any::type_name::<V>(),
        std::any::type_name::<F>()
    );
    let mut sim = Simulator::<P, V, F>::new(input, config)?;
    let stdout = io::stdout();
    let mut sink = TextSink::new(BufWriter::new(stdout.lock()));
    let summary = sim.run_configured(config, &mut sink)?;
    sink.flush()?;
    log::info!(
        "finished {} ticks, {} snapshots",
        summary.ticks,
        summary.snapshots
    );
    Ok(())
}

fn run(args: &Args) -> cellflow::Result<()> {
    let input = SimInput::load(&args.input)?;
    let config = SimConfig::default()
        .with_seed(args.seed)
        .with_ticks(args.ticks);

    with_number!(args.p_type, P, {
        with_number!(args.v_type, V, {
            with_number!(args.v_flow_type, F, { simulate::<P, V, F>(&input, &config) })
        })
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("cellflow: {err}");
            ExitCode::FAILURE
        }
    }
}
