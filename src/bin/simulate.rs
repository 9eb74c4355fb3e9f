use std::process::ExitCode;

use clap::Parser;

use cluster_sched_sim::analyzer::write_records;
use cluster_sched_sim::logger;
use cluster_sched_sim::policy::Policy;
use cluster_sched_sim::scheduler::Scheduler;
use cluster_sched_sim::trace::loader::{load_jobs, load_nodes};

/// Runs one discrete-event simulation of the cluster scheduler over a fixed
/// node fleet and a job trace, writing a per-job output record file.
#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Batch cluster scheduler simulator")]
struct Args {
    /// Node inventory file (`<cpu> <mem> <count>` records).
    node_file: String,

    /// Job trace file.
    job_file: String,

    /// Queueing policy: fifo, sjf, hrrn, or mf.
    policy: Policy,

    /// Use the trace's `predict_lgb` estimator instead of `timelimit`.
    #[arg(long)]
    predict: bool,

    /// Workload-compression ratio applied to submit times.
    #[arg(long, default_value_t = 1.0)]
    ratio: f64,

    /// Output path for the per-job result records.
    #[arg(short, long, default_value = "simulation_result.txt")]
    output: String,
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

    let jobs = match load_jobs(&args.job_file, args.predict, args.ratio) {
        Ok(j) => j,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    log::info!("loaded {} node(s), {} job(s); policy={}, predict={}, ratio={}", nodes.len(), jobs.len(), args.policy, args.predict, args.ratio);

    let mut scheduler = Scheduler::new(nodes, jobs, args.policy);
    if let Err(e) = scheduler.run() {
        log::error!("simulation aborted: {}", e);
        return ExitCode::from(2);
    }

    if let Err(e) = write_records(&args.output, &scheduler.output_records()) {
        log::error!("failed to write results: {}", e);
        return ExitCode::from(2);
    }

    log::info!("simulation done; {} job(s) dropped; results written to '{}'", scheduler.dropped.len(), args.output);
    ExitCode::SUCCESS
}
