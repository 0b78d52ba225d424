use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hcftl::api::{DsmRange, Request};
use hcftl::config::DeviceConfig;
use hcftl::ftl::Ftl;
use hcftl::ring::{ReplyRing, RequestRing};
use hcftl::timing::LatencyTimingModel;

#[derive(Debug, Parser)]
#[clap(name = "hcftl")]
#[clap(about = "Hot/cold segregated flash translation layer for an emulated NAND SSD.", long_about = None)]
struct Cli {
    /// Path to a device config JSON file. Falls back to the built-in default geometry.
    #[clap(long, global = true)]
    config: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a synthetic write/read/trim workload and report write amplification.
    Run {
        /// Number of host writes to issue before reporting.
        #[clap(long, default_value_t = 100_000)]
        writes: u64,

        /// Logical page span the workload writes into.
        #[clap(long, default_value_t = 4_096)]
        span: u64,

        /// Percent of writes aimed at a small hot subrange of `span`.
        #[clap(long, default_value_t = 20)]
        hot_pcent: u64,
    },
    /// Print the effective device geometry and derived constants, then exit.
    ShowGeometry,
}

fn load_config(path: Option<&str>) -> Result<DeviceConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading config file {p}"))?;
            DeviceConfig::from_json_str(&text).with_context(|| format!("parsing config file {p}"))
        }
        None => Ok(DeviceConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::ShowGeometry => {
            let geo = cfg.geometry;
            println!("total pages:  {}", geo.tt_pgs());
            println!("total blocks: {}", geo.tt_blks());
            println!("total lines:  {}", geo.tt_lines());
            println!("pages/line:   {}", geo.pgs_per_line());
            println!("gc threshold (low):  {} lines", cfg.gc_thres_lines());
            println!("gc threshold (high): {} lines", cfg.gc_thres_lines_high());
            Ok(())
        }
        Commands::Run { writes, span, hot_pcent } => run_workload(cfg, writes, span, hot_pcent),
    }
}

/// A tiny xorshift-style PRNG so the workload is deterministic without
/// pulling `rand` into the binary's own runtime dependencies.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

/// Drives a deterministic write-heavy workload through a worker loop fed by
/// a request ring, the same plumbing a real front-end would use, then
/// prints the resulting write amplification and free-pool split.
fn run_workload(cfg: DeviceConfig, writes: u64, span: u64, hot_pcent: u64) -> Result<()> {
    let tt_pgs = cfg.geometry.tt_pgs();
    let span = span.min(tt_pgs).max(1);
    let hot_span = (span * 5 / 100).max(1);

    let timing = LatencyTimingModel::new(&cfg);
    let mut ftl = Ftl::new(cfg, timing).context("constructing ftl")?;

    let requests = RequestRing::new(1024);
    let replies = ReplyRing::new(1024);

    log::info!("running {writes} writes over a {span}-page span ({hot_pcent}% hot)");

    let mut rng = Lcg(0x2545F4914F6CDD1D);
    let mut issued = 0u64;
    while issued < writes {
        while issued < writes {
            let roll = rng.next() % 100;
            let lpn = if roll < hot_pcent { rng.next() % hot_span } else { rng.next() % span };
            if requests.push(Request::write(lpn, 1, 0)).is_err() {
                break;
            }
            issued += 1;
        }
        ftl.run_worker(&requests, &replies);
        while replies.pop().is_some() {}
    }

    // a trim pass over the first tenth of the span, exercising the DSM path
    let trim_ranges = vec![DsmRange { slba: 0, nlb: (span / 10).max(1) }];
    requests.push(Request::trim(trim_ranges, 0)).ok();
    ftl.run_worker(&requests, &replies);
    while replies.pop().is_some() {}

    let stats = ftl.stats();
    println!("host writes: {}", stats.host_writes);
    println!("nand writes: {}", stats.nand_writes);
    println!("gc writes:   {}", stats.gc_writes);
    println!("waf:         {:.3}", stats.waf());
    println!("gc overhead: {:.1}%", stats.gc_overhead_pcent());
    println!("free lines:  hot={} cold={}", ftl.lines().hot_free_cnt(), ftl.lines().cold_free_cnt());
    Ok(())
}
