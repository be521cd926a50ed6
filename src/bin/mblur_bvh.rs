use clap::*;

use mblur_bvh::accelerators::bvh::*;
use mblur_bvh::core::error::*;
use mblur_bvh::core::misc::*;
use mblur_bvh::core::scene::*;
use mblur_bvh::core::stats;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::process;
use std::thread::available_parallelism;
use std::time::Instant;

use log::*;

#[derive(Debug, Parser)]
#[clap(author, about, version)]
struct CommandOptions {
    /// JSON file with build settings. Flags below override it.
    #[arg(long, value_name = "file.json")]
    pub settings: Option<PathBuf>,

    /// Number of random moving boxes to build over.
    #[arg(short = 'n', long, default_value = "100000", value_name = "num")]
    pub prims: usize,

    /// Time segments of every box.
    #[arg(long, default_value = "4", value_name = "num")]
    pub segments: u32,

    /// Seed of the random scene.
    #[arg(long, default_value = "0", value_name = "num")]
    pub seed: u64,

    #[arg(long = "branching-factor", value_name = "num")]
    pub branching_factor: Option<usize>,

    #[arg(long = "max-leaf-size", value_name = "num")]
    pub max_leaf_size: Option<usize>,

    /// Force every leaf primitive to span a single time segment.
    #[arg(long = "single-leaf-time-segment", default_value = "false")]
    pub single_leaf_time_segment: bool,

    /// Nodes above this many primitives recurse in parallel.
    #[arg(long, value_name = "num")]
    pub threshold: Option<usize>,

    /// Use specified number of threads for building.
    #[arg(short = 'j', long = "nthreads", value_name = "num")]
    pub nthreads: Option<usize>,

    /// Print the build summary as JSON.
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Suppress all text output other than error messages.
    #[clap(long, default_value = "false")]
    pub quiet: bool,

    /// Log messages at or above this level (0 -> INFO,
    /// 1 -> WARNING, 2 -> ERROR, 3-> FATAL).
    #[arg(long, value_name = "num")]
    pub minloglevel: Option<i32>,
}

#[derive(Debug, Serialize)]
struct BuildReport {
    prims: usize,
    segments: u32,
    seconds: f64,
    peak_buffer_bytes: i64,
    buffer_allocations: i64,
    alloc_contexts: usize,
    settings: Settings,
    tree: MBVHTreeSummary,
}

fn init_logger(opts: &CommandOptions) {
    if let Some(minloglevel) = opts.minloglevel {
        const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        let log_level = LOG_LEVELS[(minloglevel + 2).clamp(0, 4) as usize];
        env::set_var("RUST_LOG", log_level);
    } else {
        //default log level : warn
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_owned());
        env::set_var("RUST_LOG", log_level);
    }

    env_logger::Builder::from_default_env()
        .format_target(false)
        .format_module_path(false)
        .init();
}

fn load_settings(opts: &CommandOptions) -> Result<Settings, BuildError> {
    let mut settings = match opts.settings.as_ref() {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    if let Some(branching_factor) = opts.branching_factor {
        settings.branching_factor = branching_factor;
    }
    if let Some(max_leaf_size) = opts.max_leaf_size {
        settings.max_leaf_size = max_leaf_size;
    }
    if let Some(threshold) = opts.threshold {
        settings.single_thread_threshold = threshold;
    }
    if opts.single_leaf_time_segment {
        settings.single_leaf_time_segment = true;
    }
    return Ok(settings);
}

fn build_scene(opts: &CommandOptions) -> Result<BuildReport, BuildError> {
    let settings = load_settings(opts)?;
    let scene = MotionScene::random(opts.prims, opts.segments.max(1), 100.0, 2.0, opts.seed);
    let (prims, pinfo) = scene.create_prim_refs();

    let callbacks = if opts.quiet || opts.json {
        MBVHTreeCallbacks::new()
    } else {
        MBVHTreeCallbacks::with_progress(ProgressReporter::new(prims.len(), "Building"))
    };
    let monitor = AtomicMemoryMonitor::new();

    let start = Instant::now();
    let root = build_msmblur(prims, &pinfo, &monitor, &scene, &callbacks, &settings)?;
    let seconds = start.elapsed().as_secs_f64();
    if let Some(progress) = callbacks.progress() {
        progress.done();
    }

    if monitor.current() != 0 {
        warn!("{} bytes of primref buffers were not released.", monitor.current());
    }

    return Ok(BuildReport {
        prims: opts.prims,
        segments: opts.segments,
        seconds,
        peak_buffer_bytes: monitor.peak(),
        buffer_allocations: monitor.allocations(),
        alloc_contexts: callbacks.alloc_count(),
        settings,
        tree: root.node.summary(),
    });
}

fn print_report(report: &BuildReport) {
    let tree = &report.tree;
    println!(
        "Built motion blur BVH over {} prims ({} time segments) in {:.3}s",
        report.prims, report.segments, report.seconds
    );
    println!(
        "  nodes {}  leaves {}  height {}  max leaf size {}",
        tree.nodes, tree.leaves, tree.height, tree.max_leaf_size
    );
    println!(
        "  references {}  distinct prims {}  time split nodes {}",
        tree.primitive_references, tree.distinct_primitives, tree.time_split_nodes
    );
    println!(
        "  peak buffer memory {} bytes in {} buffers, {} alloc contexts",
        report.peak_buffer_bytes, report.buffer_allocations, report.alloc_contexts
    );
}

pub fn main() {
    let opts = CommandOptions::parse();
    init_logger(&opts);

    if let Some(nthreads) = opts.nthreads {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nthreads)
            .build_global();
        if let Err(e) = pool {
            warn!("{}", e);
        }
    }

    stats::clear_stats();
    if !opts.quiet && !opts.json {
        let ncores = available_parallelism().map(|n| n.get()).unwrap_or(1);
        let version = env!("CARGO_PKG_VERSION");
        println!("mblur-bvh version {} [Detected {} cores]", version, ncores);
        println!();
    }

    match build_scene(&opts) {
        Ok(report) => {
            if opts.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        error!("{}", e);
                        process::exit(-1);
                    }
                }
            } else if !opts.quiet {
                print_report(&report);
                stats::print_stats();
            }
        }
        Err(e) => {
            error!("{}", e);
            process::exit(-1);
        }
    }
    stats::clear_stats();
}
