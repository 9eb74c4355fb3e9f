use std::fs;
use std::io::Write;

use crate::error::{Error, Result};
use crate::job::Job;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRecord {
    pub submit_time: i64,
    pub ended: bool,
    pub start_time: i64,
    pub execution_time: i64,
    pub node_num: usize,
    pub cpu_req: i64,
}

impl OutputRecord {
    fn from_job(job: &Job) -> Self {
        OutputRecord {
            submit_time: job.submit_time,
            ended: job.ended,
            start_time: job.start_time,
            execution_time: job.execution_time,
            node_num: job.node_num,
            cpu_req: job.req.cpu,
        }
    }
}

/// Aggregate quality-of-service metrics computed over `[window_start,
/// window_end)`. Dropped or never-placed jobs (`ended == 0`) are excluded
/// from all three.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub mean_waiting_time: f64,
    pub mean_bounded_slowdown: f64,
    pub cpu_utilization: f64,
}

/// Writes one output line per job, in submit order.
pub fn write_records(path: &str, jobs: &[Job]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|e| Error::Io(path.to_string(), e))?;
    for job in jobs {
        let r = OutputRecord::from_job(job);
        writeln!(file, "{} {} {} {} {} {}", r.submit_time, r.ended as u8, r.start_time, r.execution_time, r.node_num, r.cpu_req)
            .map_err(|e| Error::Io(path.to_string(), e))?;
    }
    Ok(())
}

pub fn load_records(path: &str) -> Result<Vec<OutputRecord>> {
    let text = fs::read_to_string(path).map_err(|e| Error::Io(path.to_string(), e))?;
    let mut records = Vec::new();

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 6 {
            return Err(Error::MalformedInput {
                file: path.to_string(),
                field: "record".to_string(),
                reason: format!("expected 6 whitespace-separated fields, got {}", fields.len()),
            });
        }

        let parse = |field: &str, tok: &str| -> Result<i64> {
            tok.parse::<i64>().map_err(|e| Error::MalformedInput { file: path.to_string(), field: field.to_string(), reason: e.to_string() })
        };

        records.push(OutputRecord {
            submit_time: parse("submit_time", fields[0])?,
            ended: parse("ended", fields[1])? != 0,
            start_time: parse("start_time", fields[2])?,
            execution_time: parse("execution_time", fields[3])?,
            node_num: parse("node_num", fields[4])? as usize,
            cpu_req: parse("cpu_req", fields[5])?,
        });
    }

    Ok(records)
}

/// Mean waiting time, mean bounded slowdown, and CPU utilization over
/// `[window_start, window_end)`, given the fleet's total CPU capacity.
pub fn compute_metrics(records: &[OutputRecord], total_cpu: i64, window_start: i64, window_end: i64) -> Metrics {
    let ended: Vec<&OutputRecord> = records.iter().filter(|r| r.ended).collect();

    if ended.is_empty() {
        return Metrics { mean_waiting_time: 0.0, mean_bounded_slowdown: 0.0, cpu_utilization: 0.0 };
    }

    let mut total_wait = 0.0;
    let mut total_slowdown = 0.0;
    let mut cpu_used_time = 0.0;

    for r in &ended {
        let wait = (r.start_time - r.submit_time) as f64;
        let floor = r.execution_time.max(60) as f64;
        total_wait += wait;
        total_slowdown += (wait + floor) / floor;

        let end = r.start_time + r.execution_time;
        if end < window_start || r.start_time > window_end {
            continue;
        }
        let overlap = end.min(window_end) - r.start_time.max(window_start);
        if overlap > 0 {
            cpu_used_time += r.node_num as f64 * r.cpu_req as f64 * overlap as f64;
        }
    }

    let cpu_total_time = total_cpu as f64 * (window_end - window_start) as f64;
    let cpu_utilization = if cpu_total_time > 0.0 { cpu_used_time / cpu_total_time } else { 0.0 };

    Metrics {
        mean_waiting_time: total_wait / ended.len() as f64,
        mean_bounded_slowdown: total_slowdown / ended.len() as f64,
        cpu_utilization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(submit: i64, ended: bool, start: i64, exec: i64, node_num: usize, cpu: i64) -> OutputRecord {
        OutputRecord { submit_time: submit, ended, start_time: start, execution_time: exec, node_num, cpu_req: cpu }
    }

    #[test]
    fn dropped_jobs_are_excluded_from_all_metrics() {
        let records = vec![rec(0, true, 0, 10, 1, 4), rec(0, false, -1, 10, 1, 16)];
        let m = compute_metrics(&records, 8, 0, 100);
        assert_eq!(m.mean_waiting_time, 0.0);
    }

    #[test]
    fn utilization_matches_s1_scenario() {
        // S1: two jobs, each req (4,0), both start at 0 and end at 10 on an 8-cpu node.
        let records = vec![rec(0, true, 0, 10, 1, 4), rec(0, true, 0, 10, 1, 4)];
        let m = compute_metrics(&records, 8, 0, 10);
        assert!((m.cpu_utilization - 1.0).abs() < 1e-9);
    }

    #[test]
    fn waiting_time_matches_s2_scenario() {
        // S2: J1 starts at 0, J2 starts at 10 after J1 frees the node -> avg wait 5.
        let records = vec![rec(0, true, 0, 10, 1, 8), rec(0, true, 10, 10, 1, 8)];
        let m = compute_metrics(&records, 8, 0, 20);
        assert!((m.mean_waiting_time - 5.0).abs() < 1e-9);
    }

    #[test]
    fn write_then_load_round_trips() {
        let job = {
            let mut j = Job::new(1, 0, 10, 10, 1, crate::resource::Resource::new(4, 0), 10, 0);
            j.start_time = 0;
            j.ended = true;
            j
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        write_records(path, &[job.clone()]).unwrap();
        let records = load_records(path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start_time, job.start_time);
        assert_eq!(records[0].cpu_req, job.req.cpu);
    }
}
