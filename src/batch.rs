use rayon::prelude::*;

use crate::analyzer::write_records;
use crate::error::Result;
use crate::node::Node;
use crate::policy::Policy;
use crate::scheduler::Scheduler;
use crate::trace::loader::load_jobs;

/// One policy × predictor × ratio combination to simulate.
#[derive(Debug, Clone, Copy)]
pub struct SweepPoint {
    pub policy: Policy,
    pub use_predict: bool,
    pub ratio: f64,
}

impl SweepPoint {
    /// Matches `policy + "_" + predict + "_" + ratio`.
    pub fn name(&self) -> String {
        let predict = if self.use_predict { "time_pred" } else { "timelimit" };
        format!("{}_{}_x{:.6}", self.policy, predict, self.ratio)
    }
}

/// The full product `{FIFO, SJF, HRRN, MF} × {timelimit, time_pred} ×
/// ratio`, one independent simulation per point. This layer may run
/// simulations in parallel; a single simulation never does.
pub fn sweep_points(ratios: &[f64]) -> Vec<SweepPoint> {
    let policies = [Policy::Fifo, Policy::Sjf, Policy::Hrrn, Policy::Mf];
    let predictors = [false, true];

    let mut points = Vec::new();
    for &policy in &policies {
        for &use_predict in &predictors {
            for &ratio in ratios {
                points.push(SweepPoint { policy, use_predict, ratio });
            }
        }
    }
    points
}

/// Runs every sweep point independently (in parallel via `rayon`) against
/// the same node fleet and job trace, writing one result file per point
/// under `out_dir`. Returns the file-name stems written, so a caller can
/// feed them straight to the analyzer.
pub fn run_sweep(nodes_template: &[Node], job_path: &str, out_dir: &str, ratios: &[f64]) -> Result<Vec<String>> {
    std::fs::create_dir_all(out_dir).map_err(|e| crate::error::Error::Io(out_dir.to_string(), e))?;

    let points = sweep_points(ratios);

    points
        .par_iter()
        .map(|point| {
            let jobs = load_jobs(job_path, point.use_predict, point.ratio)?;
            let nodes: Vec<Node> = nodes_template.iter().map(|n| Node::new(n.id, n.total)).collect();

            let mut scheduler = Scheduler::new(nodes, jobs, point.policy);
            scheduler.run()?;

            let name = point.name();
            let out_path = format!("{}/{}_simulation_result.txt", out_dir, name);
            write_records(&out_path, &scheduler.output_records())?;

            Ok(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_points_cover_full_product() {
        let points = sweep_points(&[0.5, 1.0]);
        assert_eq!(points.len(), 4 * 2 * 2);
    }

    #[test]
    fn sweep_point_name_matches_original_convention() {
        let p = SweepPoint { policy: Policy::Mf, use_predict: true, ratio: 1.0 };
        assert_eq!(p.name(), "mf_time_pred_x1.000000");
    }
}
