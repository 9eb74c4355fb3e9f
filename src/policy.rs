use std::str::FromStr;

use crate::job::Job;

/// The four queueing policies from the workload trace study. Each maps a
/// pending job to a key; smaller keys are placed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Smaller `submit_time` first.
    Fifo,
    /// Smaller `predict_time` first.
    Sjf,
    /// Larger response ratio `(wait + predict) / predict` first.
    Hrrn,
    /// Larger `priority` first.
    Mf,
}

impl Policy {
    /// The pending-queue key for `job` at the current clock `now`. Two jobs
    /// with equal keys are ordered by `id` by the caller, keeping the
    /// simulation reproducible.
    pub fn score(&self, job: &Job, now: i64) -> f64 {
        match self {
            Policy::Fifo => job.submit_time as f64,
            Policy::Sjf => job.predict_time as f64,
            Policy::Hrrn => {
                let wait = (now - job.submit_time) as f64;
                -((job.predict_time as f64 + wait) / job.predict_time as f64)
            }
            Policy::Mf => -(job.priority as f64),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(Policy::Fifo),
            "sjf" => Ok(Policy::Sjf),
            "hrrn" => Ok(Policy::Hrrn),
            "mf" => Ok(Policy::Mf),
            other => Err(format!("unknown policy '{}', expected one of fifo/sjf/hrrn/mf", other)),
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Policy::Fifo => "fifo",
            Policy::Sjf => "sjf",
            Policy::Hrrn => "hrrn",
            Policy::Mf => "mf",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    fn job(submit: i64, predict: i64, priority: i64) -> Job {
        Job::new(0, submit, predict.max(1), predict, 1, Resource::new(1, 0), predict, priority)
    }

    #[test]
    fn fifo_orders_by_submit_time() {
        let early = job(0, 10, 0);
        let late = job(5, 10, 0);
        assert!(Policy::Fifo.score(&early, 5) < Policy::Fifo.score(&late, 5));
    }

    #[test]
    fn sjf_orders_by_predict_time() {
        let short = job(0, 5, 0);
        let long = job(0, 50, 0);
        assert!(Policy::Sjf.score(&short, 0) < Policy::Sjf.score(&long, 0));
    }

    #[test]
    fn hrrn_prefers_longer_waiting_job_with_equal_predict_time() {
        let fresh = job(10, 10, 0);
        let stale = job(0, 10, 0);
        assert!(Policy::Hrrn.score(&stale, 10) < Policy::Hrrn.score(&fresh, 10));
    }

    #[test]
    fn mf_prefers_higher_priority() {
        let urgent = job(0, 10, 5);
        let routine = job(0, 10, 1);
        assert!(Policy::Mf.score(&urgent, 0) < Policy::Mf.score(&routine, 0));
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("FIFO".parse::<Policy>().unwrap(), Policy::Fifo);
        assert!("bogus".parse::<Policy>().is_err());
    }
}
