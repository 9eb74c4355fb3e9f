use std::process::ExitCode;

use clap::Parser;

use cluster_sched_sim::analyzer::{compute_metrics, load_records};
use cluster_sched_sim::batch::sweep_points;
use cluster_sched_sim::logger;
use cluster_sched_sim::trace::loader::load_nodes;

const RATIOS: [f64; 10] = [0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6, 1.8, 2.0];
const SECONDS_PER_DAY: f64 = 60.0 * 60.0 * 24.0;

/// Aggregates a sweep's per-job result files into mean waiting time, mean
/// bounded slowdown, and CPU utilization, one line per policy/predictor/
/// ratio combination.
#[derive(Parser, Debug)]
#[command(name = "analyze", about = "Aggregate simulation result files into QoS metrics")]
struct Args {
    /// Measurement window end, in days from the start of the trace.
    interval_days: i64,

    /// Directory containing `<name>_simulation_result.txt` files.
    #[arg(long, default_value = ".")]
    dir: String,

    /// Node inventory file used to compute total fleet CPU capacity.
    #[arg(long, default_value = "nodes_info.txt")]
    node_file: String,
}

fn main() -> ExitCode {
    logger::init();

    let args = match Args::try_parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    let nodes = match load_nodes(&args.node_file) {
        Ok(n) => n,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };
    let total_cpu: i64 = nodes.iter().map(|n| n.total.cpu).sum();

    let points = sweep_points(&RATIOS);
    for point in points {
        let name = point.name();
        let in_path = format!("{}/{}_simulation_result.txt", args.dir, name);

        let records = match load_records(&in_path) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping '{}': {}", in_path, e);
                continue;
            }
        };

        let window_end = (SECONDS_PER_DAY * args.interval_days as f64 / (0.2 * (RATIOS.iter().position(|r| *r == point.ratio).unwrap() as f64 + 1.0)))
            as i64;
        let metrics = compute_metrics(&records, total_cpu, 0, window_end);

        let out_path = format!("{}/{}_analysis_result.txt", args.dir, name);
        let body = format!(
            "avg_pending_time: {}\navg_bounded_slowdown: {}\ncpu_utilization: {}\n",
            metrics.mean_waiting_time, metrics.mean_bounded_slowdown, metrics.cpu_utilization
        );
        if let Err(e) = std::fs::write(&out_path, body) {
            log::error!("failed to write '{}': {}", out_path, e);
            return ExitCode::from(2);
        }
    }

    ExitCode::SUCCESS
}
