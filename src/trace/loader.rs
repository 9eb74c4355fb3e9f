use std::fs;

use crate::error::{Error, Result};
use crate::job::Job;
use crate::node::Node;
use crate::resource::Resource;

/// Reads whitespace-separated `<cpu> <mem> <count>` records, repeating to
/// end-of-file. Each record creates `count` identical nodes with sequential
/// ids. Non-positive values are rejected.
pub fn load_nodes(path: &str) -> Result<Vec<Node>> {
    let text = fs::read_to_string(path).map_err(|e| Error::Io(path.to_string(), e))?;
    let mut tokens = text.split_whitespace();
    let mut nodes = Vec::new();

    loop {
        let Some(cpu_tok) = tokens.next() else { break };
        let mem_tok = next_field(&mut tokens, path, "mem")?;
        let count_tok = next_field(&mut tokens, path, "count")?;

        let cpu = parse_field(path, "cpu", cpu_tok)?;
        let mem = parse_field(path, "mem", mem_tok)?;
        let count = parse_field(path, "count", count_tok)?;

        if cpu <= 0 || mem <= 0 || count <= 0 {
            return Err(Error::MalformedInput {
                file: path.to_string(),
                field: "cpu/mem/count".to_string(),
                reason: format!("all of cpu ({}), mem ({}), count ({}) must be positive", cpu, mem, count),
            });
        }

        for _ in 0..count {
            let id = nodes.len();
            nodes.push(Node::new(id, Resource::new(cpu, mem)));
        }
    }

    Ok(nodes)
}

/// Reads whitespace-separated job records, derives `predict_time` from
/// `predict_lgb` or `timelimit` depending on `use_predict`, validates the
/// ground-truth bounds, then sorts by `submit_time`, shifts the trace to
/// start at 0, and divides by `compression_ratio` (rounded to the nearest
/// integer second).
pub fn load_jobs(path: &str, use_predict: bool, compression_ratio: f64) -> Result<Vec<Job>> {
    let text = fs::read_to_string(path).map_err(|e| Error::Io(path.to_string(), e))?;
    let mut tokens = text.split_whitespace();
    let mut jobs = Vec::new();
    let mut next_id: u64 = 0;

    loop {
        let Some(submit_tok) = tokens.next() else { break };
        let priority_tok = next_field(&mut tokens, path, "priority")?;
        let timelimit_tok = next_field(&mut tokens, path, "timelimit")?;
        let predict_lgb_tok = next_field(&mut tokens, path, "predict_lgb")?;
        let execution_time_tok = next_field(&mut tokens, path, "execution_time")?;
        let node_num_tok = next_field(&mut tokens, path, "node_num")?;
        let cpu_req_tok = next_field(&mut tokens, path, "cpu_req")?;

        let submit_time: i64 = parse_field(path, "submit_time", submit_tok)?;
        let priority: i64 = parse_field(path, "priority", priority_tok)?;
        let timelimit: i64 = parse_field(path, "timelimit", timelimit_tok)?;
        let predict_lgb: i64 = parse_field(path, "predict_lgb", predict_lgb_tok)?;
        let execution_time: i64 = parse_field(path, "execution_time", execution_time_tok)?;
        let node_num: i64 = parse_field(path, "node_num", node_num_tok)?;
        let cpu_req: i64 = parse_field(path, "cpu_req", cpu_req_tok)?;

        if node_num <= 0 {
            return Err(Error::MalformedInput { file: path.to_string(), field: "node_num".to_string(), reason: "must be positive".to_string() });
        }

        let per_node_cpu = cpu_req / node_num;
        let predict_time = if use_predict { predict_lgb } else { timelimit };

        if execution_time > timelimit {
            return Err(Error::MalformedInput {
                file: path.to_string(),
                field: "execution_time".to_string(),
                reason: format!("execution_time {} exceeds timelimit {}", execution_time, timelimit),
            });
        }
        if predict_time < 1 || predict_time > timelimit {
            return Err(Error::MalformedInput {
                file: path.to_string(),
                field: "predict_time".to_string(),
                reason: format!("predict_time {} must be in [1, timelimit={}]", predict_time, timelimit),
            });
        }

        jobs.push(Job::new(
            next_id,
            submit_time,
            timelimit,
            predict_time,
            node_num as usize,
            Resource::new(per_node_cpu, 0),
            execution_time,
            priority,
        ));
        next_id += 1;
    }

    jobs.sort_by_key(|j| j.submit_time);

    if let Some(first) = jobs.first() {
        let shift = first.submit_time;
        for job in &mut jobs {
            job.submit_time -= shift;
            job.submit_time = (job.submit_time as f64 / compression_ratio).round() as i64;
        }
    }

    Ok(jobs)
}

fn next_field<'a, I: Iterator<Item = &'a str>>(tokens: &mut I, path: &str, field: &str) -> Result<&'a str> {
    tokens.next().ok_or_else(|| Error::MalformedInput { file: path.to_string(), field: field.to_string(), reason: "missing field".to_string() })
}

fn parse_field(path: &str, field: &str, tok: &str) -> Result<i64> {
    tok.parse::<i64>()
        .map_err(|e| Error::MalformedInput { file: path.to_string(), field: field.to_string(), reason: format!("'{}' is not an integer: {}", tok, e) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", contents).unwrap();
        f
    }

    #[test]
    fn loads_repeated_node_records() {
        let f = write_temp("8 32 2\n16 64 1\n");
        let nodes = load_nodes(f.path().to_str().unwrap()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].total, Resource::new(8, 32));
        assert_eq!(nodes[2].total, Resource::new(16, 64));
        assert_eq!(nodes[2].id, 2);
    }

    #[test]
    fn rejects_non_positive_node_fields() {
        let f = write_temp("0 32 1\n");
        let err = load_nodes(f.path().to_str().unwrap());
        assert!(matches!(err, Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn jobs_are_shifted_to_start_at_zero_and_scaled() {
        let f = write_temp("100 0 10 5 5 1 4\n110 0 10 5 5 1 4\n");
        let jobs = load_jobs(f.path().to_str().unwrap(), true, 2.0).unwrap();

        assert_eq!(jobs[0].submit_time, 0);
        assert_eq!(jobs[1].submit_time, 5); // (110-100)/2.0
    }

    #[test]
    fn cpu_req_is_divided_by_node_num() {
        let f = write_temp("0 0 10 5 5 2 8\n");
        let jobs = load_jobs(f.path().to_str().unwrap(), true, 1.0).unwrap();
        assert_eq!(jobs[0].req, Resource::new(4, 0));
        assert_eq!(jobs[0].node_num, 2);
    }

    #[test]
    fn rejects_predict_time_of_zero() {
        let f = write_temp("0 0 10 0 5 1 4\n");
        let err = load_jobs(f.path().to_str().unwrap(), true, 1.0);
        assert!(matches!(err, Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn uses_timelimit_as_predict_time_when_prediction_disabled() {
        let f = write_temp("0 0 10 3 5 1 4\n");
        let jobs = load_jobs(f.path().to_str().unwrap(), false, 1.0).unwrap();
        assert_eq!(jobs[0].predict_time, 10);
    }
}
