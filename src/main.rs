use anyhow::Context;
use clap::Parser;
use fupool_sim::core::latency::{CacheLatency, FixedLatency, LatencySource};
use fupool_sim::issue::trace::parse_trace;
use fupool_sim::issue::IssueStage;
use fupool_sim::params::CoreConfig;
use log::{debug, info};
use simplelog::*;
use std::path::PathBuf;

const PROGRAM: &str = "\
IntAlu   #100
IntAlu   #200
IntMult  #100, #200
IntDiv   #20000, #7
IntDiv   #20000, #9
IntDiv   #1, #1
MemRead  w64
MemWrite w64 #-1
FloatAdd
FloatMult
SimdAdd  w128
";

#[derive(Parser, Debug)]
#[command(author, version, about = "Functional unit pool timing model", long_about = None)]
struct Args {
    /// Core configuration (TOML). The built-in high performance core if absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Micro-op trace to run. A small built-in program if absent
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Give up after this many cycles
    #[arg(short, long, default_value_t = 1_000_000)]
    max_cycles: u64,

    /// More output, -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the functional unit table when done
    #[arg(short, long)]
    dump: bool,
}

fn init_logger(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;
    Ok(())
}

fn simulate<L: LatencySource>(
    config: &CoreConfig,
    latency: L,
    text: &str,
    args: &Args,
) -> anyhow::Result<()> {
    let program = parse_trace(text)?;
    info!("{} micro-ops", program.len());
    let pool = config.pool.build()?;
    let mut stage = IssueStage::new(pool, latency, &config.core);
    let summary = stage.run(program, args.max_cycles)?;
    println!("{}", summary);
    if args.dump {
        println!("{}", stage);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose)?;

    let config = match args.config.as_ref() {
        Some(path) => CoreConfig::load_from_file(path)?,
        None => CoreConfig::o3_arm_v7a(),
    };
    debug!("Core config: {:?}", config);

    let text = match args.trace.as_ref() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading trace {}", path.display()))?,
        None => String::from(PROGRAM),
    };

    match config.cache("dcache") {
        Some(dcache) => simulate(&config, CacheLatency::from_params(dcache), &text, &args),
        None => simulate(&config, FixedLatency::default(), &text, &args),
    }
}
