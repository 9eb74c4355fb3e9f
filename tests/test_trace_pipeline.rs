use std::io::Write;

use cluster_sched_sim::analyzer::{compute_metrics, load_records, write_records};
use cluster_sched_sim::policy::Policy;
use cluster_sched_sim::scheduler::Scheduler;
use cluster_sched_sim::trace::loader::{load_jobs, load_nodes};

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{}", contents).unwrap();
    f
}

#[test]
fn loading_simulating_and_analyzing_a_trace_is_consistent_end_to_end() {
    let node_file = write_temp("8 32 1\n");
    // two jobs needing the whole node each, 10s apart in submit time.
    let job_file = write_temp("0 0 10 10 10 1 8\n0 0 10 10 10 1 8\n");

    let nodes = load_nodes(node_file.path().to_str().unwrap()).unwrap();
    let total_cpu: i64 = nodes.iter().map(|n| n.total.cpu).sum();
    let jobs = load_jobs(job_file.path().to_str().unwrap(), false, 1.0).unwrap();
    assert_eq!(jobs.len(), 2);

    let mut sched = Scheduler::new(nodes, jobs, Policy::Fifo);
    sched.run().unwrap();
    let results = sched.output_records();
    assert!(results.iter().all(|j| j.ended));

    let out_file = tempfile::NamedTempFile::new().unwrap();
    let out_path = out_file.path().to_str().unwrap();
    write_records(out_path, &results).unwrap();

    let records = load_records(out_path).unwrap();
    assert_eq!(records.len(), 2);

    let metrics = compute_metrics(&records, total_cpu, 0, 20);
    // one job starts at 0, the other must wait for the node to free at 10.
    assert!((metrics.mean_waiting_time - 5.0).abs() < 1e-9);
    assert!(metrics.cpu_utilization > 0.0);
}

#[test]
fn compression_ratio_scales_submit_times_before_simulation() {
    let job_file = write_temp("0 0 10 10 10 1 4\n200 0 10 10 10 1 4\n");
    let jobs = load_jobs(job_file.path().to_str().unwrap(), false, 2.0).unwrap();

    assert_eq!(jobs[0].submit_time, 0);
    assert_eq!(jobs[1].submit_time, 100);
}
