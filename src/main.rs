use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use plaid::{Composition, Event, Fraction};
use plaid_core::events_from_haps;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plaid")]
#[command(about = "Evaluate mini-notation patterns and sectioned compositions", long_about = None)]
struct Args {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a mini-notation pattern parses
    Validate {
        pattern: String,
    },

    /// Query a single pattern over a window of cycles
    Eval {
        pattern: String,

        /// First cycle of the window, e.g. 0, 1/2 or 1.5
        #[arg(long, default_value = "0")]
        from: Fraction,

        /// Length of the window in cycles
        #[arg(long, default_value = "1")]
        duration: Fraction,

        #[arg(long, value_enum, default_value_t = EvalFormat::Debug)]
        format: EvalFormat,
    },

    /// Render a composition's events between two cycles
    Render {
        /// Composition file (default: the bundled composition)
        #[arg(short, long)]
        composition: Option<PathBuf>,

        #[arg(long, default_value = "0")]
        from: Fraction,

        #[arg(long, default_value = "8")]
        to: Fraction,

        #[arg(long, value_enum, default_value_t = RenderFormat::Json)]
        format: RenderFormat,
    },

    /// Show which section plays at a cycle
    Resolve {
        cycle: Fraction,

        #[arg(short, long)]
        composition: Option<PathBuf>,
    },

    /// Play a composition against the wall clock, printing JSON lines
    Stream {
        #[arg(short, long)]
        composition: Option<PathBuf>,

        /// How long to run
        #[arg(long, default_value = "10")]
        seconds: f64,

        /// How far ahead of the clock each window reaches, in milliseconds
        #[arg(long, default_value = "100")]
        lookahead_ms: u64,
    },

    /// Print tempo, timeline and sections of a composition
    Info {
        #[arg(short, long)]
        composition: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EvalFormat {
    Debug,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RenderFormat {
    /// One JSON array
    Json,
    /// One JSON object per line
    Lines,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Validate { pattern } => validate(&pattern),
        Command::Eval {
            pattern,
            from,
            duration,
            format,
        } => eval(&pattern, from, duration, format),
        Command::Render {
            composition,
            from,
            to,
            format,
        } => render(composition.as_deref(), from, to, format),
        Command::Resolve { cycle, composition } => resolve(composition.as_deref(), cycle),
        Command::Stream {
            composition,
            seconds,
            lookahead_ms,
        } => stream(
            composition.as_deref(),
            seconds,
            Duration::from_millis(lookahead_ms),
        ),
        Command::Info { composition } => show_info(composition.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load(path: Option<&Path>) -> Result<Composition> {
    match path {
        Some(path) => Composition::load(path)
            .with_context(|| format!("Failed to load composition {}", path.display())),
        None => Composition::bundled().context("Failed to build the bundled composition"),
    }
}

fn validate(pattern: &str) -> Result<()> {
    plaid_mini::compile(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    println!("ok");
    Ok(())
}

fn eval(pattern: &str, from: Fraction, duration: Fraction, format: EvalFormat) -> Result<()> {
    if duration.is_negative() {
        anyhow::bail!("Duration must not be negative, got {}", duration);
    }
    let compiled =
        plaid_mini::compile(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    let haps = compiled
        .query_span(from, from + duration)
        .context("Failed to query pattern")?;

    match format {
        EvalFormat::Debug => {
            for hap in &haps {
                let whole = hap
                    .whole
                    .map(|w| w.to_string())
                    .unwrap_or_else(|| "~".to_string());
                println!("{} | {} | {}", whole, hap.part, hap.value);
            }
        }
        EvalFormat::Json => {
            let events = events_from_haps(&haps);
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }
    Ok(())
}

fn render(path: Option<&Path>, from: Fraction, to: Fraction, format: RenderFormat) -> Result<()> {
    let composition = load(path)?;
    let events = composition
        .query(from, to)
        .with_context(|| format!("Failed to render cycles {} to {}", from, to))?;
    info!(events = events.len(), "rendered");

    match format {
        RenderFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        RenderFormat::Lines => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_lines(&mut out, &events)?;
        }
    }
    Ok(())
}

fn resolve(path: Option<&Path>, cycle: Fraction) -> Result<()> {
    let composition = load(path)?;
    match composition.resolve(cycle) {
        Some(resolved) => {
            println!(
                "cycle {}: section '{}' (entry {}, pass {}), phase {} of {}",
                cycle,
                resolved.name,
                resolved.entry,
                resolved.iteration,
                resolved.phase,
                composition.arrangement().entries()[resolved.entry].weight,
            );
        }
        None => println!("cycle {}: outside the timeline", cycle),
    }
    Ok(())
}

fn stream(path: Option<&Path>, seconds: f64, lookahead: Duration) -> Result<()> {
    let run_for = run_duration(seconds)?;
    let composition = load(path)?;
    let mut scheduler = composition.scheduler(lookahead);
    let tick = Duration::from_millis(25);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let start = Instant::now();
    loop {
        let now = start.elapsed();
        let events = scheduler.update(now).context("Failed to schedule window")?;
        write_lines(&mut out, &events)?;
        out.flush()?;
        if now >= run_for {
            break;
        }
        std::thread::sleep(tick);
    }
    debug!(cursor = %scheduler.cursor(), "stream finished");
    Ok(())
}

fn run_duration(seconds: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) => Ok(duration),
        Err(_) => anyhow::bail!(
            "Seconds must be a non-negative number that fits a duration, got {}",
            seconds
        ),
    }
}

fn show_info(path: Option<&Path>) -> Result<()> {
    let composition = load(path)?;
    let tempo = composition.tempo();
    let arrangement = composition.arrangement();

    println!("{}", composition.title());
    println!(
        "tempo: {} bpm, {} beats per cycle ({} cycles per minute)",
        tempo.bpm(),
        tempo.beats_per_cycle(),
        tempo.cycles_per_minute()
    );
    println!(
        "timeline: {} entries, {} cycles ({:.1}s){}",
        arrangement.entries().len(),
        arrangement.total_cycles(),
        composition.duration_secs(),
        if arrangement.is_looping() { ", looping" } else { "" }
    );
    for entry in arrangement.entries() {
        println!(
            "  {}@{}",
            arrangement.section_name(entry.section),
            entry.weight
        );
    }
    println!(
        "sections: {}",
        arrangement.section_names().collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

fn write_lines(out: &mut impl Write, events: &[Event]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)?;
    }
    Ok(())
}
