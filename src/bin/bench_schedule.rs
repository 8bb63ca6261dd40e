//! Benchmark tile schedule construction at large scales.
//!
//! Run with: cargo run --release --features cli --bin bench_schedule
//!
//! Usage:
//!   bench_schedule                       Run default size (128 groups)
//!   bench_schedule 128 8k 64k            Run multiple group counts
//!   bench_schedule --tokens-per-group 512
//!   bench_schedule --skew 1.5            Power-law routing (0 = uniform)
//!   bench_schedule -n 10                 Run 10 iterations (for profiling)
//!
//! Set RUST_LOG=tile_schedule=debug for stage logs. For per-stage timing,
//! build with: cargo run --release --features cli,timing --bin bench_schedule

use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::time::Instant;
use tile_schedule::validation::validate;
use tile_schedule::{compute_schedule_timed, ScanStrategy, ScheduleConfig};
use tracing_subscriber::EnvFilter;

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

fn parse_scan(s: &str) -> Result<ScanStrategy, String> {
    ScanStrategy::parse(s).ok_or_else(|| format!("Unknown scan strategy '{}'", s))
}

#[derive(Parser)]
#[command(name = "bench_schedule")]
#[command(about = "Benchmark tile schedule construction at various scales")]
struct Args {
    /// Group counts to benchmark (e.g., 128, 8k, 64k)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Average routed items per group; total items = groups * this
    #[arg(long, default_value_t = 256)]
    tokens_per_group: usize,

    /// Items per tile
    #[arg(short, long, default_value_t = 128)]
    tile_dim: usize,

    /// Power-law exponent for routing weights (0 = uniform)
    #[arg(long, default_value_t = 0.0)]
    skew: f64,

    /// Scan strategy: sequential, blocked or auto
    #[arg(long, value_parser = parse_scan, default_value = "auto")]
    scan: ScanStrategy,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Check every schedule against an independent recomputation
    #[arg(long)]
    validate: bool,

    /// Number of iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,
}

/// Route `tokens` items to `groups` groups with weight `1 / (i + 1)^skew`.
fn generate_histogram(groups: usize, tokens: usize, skew: f64, seed: u64) -> Vec<u32> {
    let mut hist = vec![0u32; groups];
    if groups == 0 {
        return hist;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut cdf = Vec::with_capacity(groups);
    let mut acc = 0.0f64;
    for i in 0..groups {
        acc += 1.0 / ((i + 1) as f64).powf(skew);
        cdf.push(acc);
    }

    for _ in 0..tokens {
        let u: f64 = rng.gen_range(0.0..acc);
        let g = cdf.partition_point(|&c| c <= u).min(groups - 1);
        hist[g] += 1;
    }
    hist
}

fn format_rate(count: usize, ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    let per_sec = count as f64 / (ms / 1000.0);
    if per_sec >= 1_000_000.0 {
        format!("{:.2}M/s", per_sec / 1_000_000.0)
    } else if per_sec >= 1_000.0 {
        format!("{:.1}k/s", per_sec / 1000.0)
    } else {
        format!("{:.0}/s", per_sec)
    }
}

fn format_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        format!("{}", n)
    }
}

struct BenchResult {
    groups: usize,
    tokens: usize,
    time_ms: f64,
    tiles: usize,
    capacity: usize,
    buffer_len: usize,
}

fn run_benchmark(
    histogram: &[u32],
    tokens: usize,
    tile_dim: usize,
    config: &ScheduleConfig,
    check: bool,
) -> Result<BenchResult, String> {
    let t0 = Instant::now();
    let (schedule, timings) = compute_schedule_timed(Some(histogram), tokens, tile_dim, config)
        .map_err(|e| e.to_string())?;
    let time_ms = t0.elapsed().as_secs_f64() * 1000.0;
    timings.report(schedule.num_groups());

    if check || cfg!(debug_assertions) {
        let report = validate(&schedule, histogram, tile_dim as u32);
        if !report.is_valid() {
            eprintln!("WARNING: Validation failed for tokens={}: {}", tokens, report);
        } else if check {
            println!("Validation passed: {}", report);
        }
    }

    Ok(BenchResult {
        groups: histogram.len(),
        tokens,
        time_ms,
        tiles: schedule.total_tiles().unwrap_or(0),
        capacity: schedule.capacity().unwrap_or(0),
        buffer_len: schedule.raw().map_or(0, <[u32]>::len),
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    println!("tile-schedule Benchmark");
    println!("=======================\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![128]
    } else {
        args.sizes
    };

    let config = ScheduleConfig {
        scan: args.scan,
        ..ScheduleConfig::from_env()
    };

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  tokens/group = {}", args.tokens_per_group);
    println!("  tile_dim = {}", args.tile_dim);
    println!("  skew = {}", args.skew);
    println!("  scan = {:?}", config.scan);
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| format_num(n)).collect::<Vec<_>>()
    );
    if args.repeat > 1 {
        println!("  repeat = {}", args.repeat);
    }

    #[cfg(feature = "timing")]
    println!("  timing = enabled (per-stage timing is logged at info level)");

    let mut results: Vec<BenchResult> = Vec::new();

    for &groups in &sizes {
        let tokens = groups * args.tokens_per_group;
        println!("\n{}", "=".repeat(60));
        println!(
            "Benchmarking groups = {}, tokens = {}",
            format_num(groups),
            format_num(tokens)
        );
        println!("{}", "=".repeat(60));
        println!("  scan resolves to {:?}", config.resolve_scan(groups));

        let t_gen = Instant::now();
        let histogram = generate_histogram(groups, tokens, args.skew, args.seed);
        let gen_time = t_gen.elapsed().as_secs_f64() * 1000.0;
        println!("Histogram generation: {:.1}ms", gen_time);

        let mut times: Vec<f64> = Vec::with_capacity(args.repeat);
        let mut last_result: Option<BenchResult> = None;

        for iter in 0..args.repeat.max(1) {
            if args.repeat > 1 {
                print!("  Iteration {}/{}... ", iter + 1, args.repeat);
                let _ = io::stdout().flush();
            }

            let result =
                match run_benchmark(&histogram, tokens, args.tile_dim, &config, args.validate) {
                    Ok(result) => result,
                    Err(e) => {
                        eprintln!("error: {}", e);
                        std::process::exit(1);
                    }
                };
            times.push(result.time_ms);

            if args.repeat > 1 {
                println!("{:.3}ms", result.time_ms);
            }

            last_result = Some(result);
        }

        let Some(result) = last_result else {
            continue;
        };

        println!("\nResults:");
        if args.repeat > 1 {
            let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = times.iter().sum::<f64>() / times.len() as f64;
            println!("  Min time:      {:>8.3}ms", min);
            println!("  Max time:      {:>8.3}ms", max);
            println!("  Avg time:      {:>8.3}ms", avg);
            println!("  Throughput:    {:>8} (avg)", format_rate(result.tokens, avg));
        } else {
            println!("  Total time:    {:>8.3}ms", result.time_ms);
            println!(
                "  Throughput:    {:>8}",
                format_rate(result.tokens, result.time_ms)
            );
        }
        println!("  Tiles:         {:>8}", format_num(result.tiles));
        println!("  Capacity:      {:>8}", format_num(result.capacity));
        println!(
            "  Occupancy:     {:>7.1}%",
            if result.capacity > 0 {
                result.tiles as f64 / result.capacity as f64 * 100.0
            } else {
                0.0
            }
        );
        println!(
            "  Buffer:        {:>8} ({:.1} KiB)",
            format_num(result.buffer_len),
            result.buffer_len as f64 * 4.0 / 1024.0
        );

        results.push(result);
    }

    if results.len() > 1 {
        println!("\n\n{}", "=".repeat(60));
        println!("SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "{:>10} | {:>10} | {:>10} | {:>12} | {:>10}",
            "groups", "tokens", "time", "throughput", "tiles"
        );
        println!(
            "{:-<10}-+-{:-<10}-+-{:-<10}-+-{:-<12}-+-{:-<10}",
            "", "", "", "", ""
        );

        for r in &results {
            println!(
                "{:>10} | {:>10} | {:>8.3}ms | {:>12} | {:>10}",
                format_num(r.groups),
                format_num(r.tokens),
                r.time_ms,
                format_rate(r.tokens, r.time_ms),
                format_num(r.tiles)
            );
        }
    }

    println!("\nBenchmark complete.");
}
