//! E20 Simulator - CLI Entry Point
//!
//! ```text
//! e20sim [-h] [--cache CACHE] filename
//! ```
//!
//! Without `--cache` the program runs to completion and the final machine
//! state is printed. With `--cache` the cache configuration and one log
//! line per cache access are printed instead.

use clap::{ArgAction, Parser};
use e20::{Cpu, CpuError, HierarchyConfig, MemoryAccess, MemoryObserver};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "e20sim")]
#[command(about = "Simulate E20 machine")]
struct Cli {
    /// The file containing machine code, typically with .bin suffix
    filename: PathBuf,

    /// Cache configuration: size,assoc,blocksize (for one cache) or
    /// size,assoc,blocksize,size,assoc,blocksize (for two caches)
    #[arg(long, value_name = "CACHE")]
    cache: Option<HierarchyConfig>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,

    /// Print a listing of the loaded program instead of running it
    #[arg(long)]
    disassemble: bool,

    /// Stop after this many instructions even if the program has not halted
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Log more detail to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    // Help and usage errors both go to stderr with status 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{}", e.render());
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose);

    let mut cpu = Cpu::new();
    let program = match e20::load_into(&mut cpu, &cli.filename) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if cli.disassemble {
        print!("{}", e20::disassemble(&program));
        return;
    }

    let result = match &cli.cache {
        Some(config) => run_with_cache(&mut cpu, config, cli.max_steps),
        None => run(&mut cpu, &mut e20::cpu::NullObserver, cli.max_steps),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let state = e20::FinalState::capture(&cpu, e20::report::DUMP_WORDS);
    if cli.json {
        match state.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    } else if cli.cache.is_none() {
        print!("{}", state);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run<O: MemoryObserver + ?Sized>(cpu: &mut Cpu, observer: &mut O, max_steps: Option<u64>) -> Result<(), CpuError> {
    match max_steps {
        Some(limit) => {
            cpu.run_limited(observer, limit)?;
            if cpu.is_running() {
                log::warn!("stopped after {} instructions without halting (pc={})", limit, cpu.regs.pc);
            }
        }
        None => {
            cpu.run(observer)?;
        }
    }
    Ok(())
}

fn run_with_cache(cpu: &mut Cpu, config: &HierarchyConfig, max_steps: Option<u64>) -> Result<(), CpuError> {
    use e20::cache::CacheHierarchy;
    use e20::report::cache_config_line;

    let mut caches = CacheHierarchy::new(config);
    for cache in caches.levels() {
        println!("{}", cache_config_line(cache.level(), cache.config()));
    }

    let mut observer = |access: MemoryAccess| {
        caches.access(access, |event| println!("{}", event));
    };
    run(cpu, &mut observer, max_steps)?;

    for (level, stats) in caches.stats() {
        log::info!(
            "{}: {} hits, {} misses, {} writes, {} evictions",
            level, stats.hits, stats.misses, stats.writes, stats.evictions
        );
    }
    Ok(())
}
