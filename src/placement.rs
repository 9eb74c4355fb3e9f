use crate::error::{Error, Result};
use crate::job::{Job, NodeId};
use crate::node::Node;
use crate::reservation::INF;
use crate::resource::Resource;

/// Outcome of one placement attempt for a single pending job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Placed and started immediately at `NOW`.
    Started,
    /// A feasible window exists but only in the future; the job is re-queued
    /// to arrivals at its original `submit_time` key.
    Deferred,
    /// Fewer qualifying nodes exist than `node_num`; the job is dropped.
    Infeasible { available: usize },
}

/// Selects up to `node_num` nodes whose permanent `total` admits `req`,
/// ordered worst-fit-by-cpu (highest current `avail.cpu` first, ties broken
/// by node id for determinism). This is a heuristic that spreads load; it
/// does not guarantee the nodes that free up earliest are chosen.
fn select_candidate_nodes(nodes: &[Node], req: &Resource, node_num: usize) -> Vec<NodeId> {
    let mut qualifying: Vec<NodeId> = nodes.iter().filter(|n| n.total.covers(req)).map(|n| n.id).collect();

    qualifying.sort_by(|&a, &b| {
        let av = nodes[a].avail.cpu;
        let bv = nodes[b].avail.cpu;
        bv.cmp(&av).then_with(|| a.cmp(&b))
    });

    qualifying.truncate(node_num);
    qualifying
}

/// Finds the smallest `t >= now` such that every interval in `infeasible`
/// covering `t` has ended and the zero-coverage run starting at `t` lasts
/// at least `duration`. `infeasible` is the union (not intersection) of
/// per-node infeasibility intervals: the job needs every chosen node
/// simultaneously free.
fn earliest_feasible_start(now: i64, duration: i64, infeasible: &[(i64, i64)]) -> i64 {
    let mut breakpoints: Vec<i64> = vec![now, INF];
    for &(l, r) in infeasible {
        breakpoints.push(l);
        breakpoints.push(r);
    }
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let mut coverage = vec![0i64; breakpoints.len()];
    for &(l, r) in infeasible {
        let li = breakpoints.binary_search(&l).expect("l was inserted above");
        let ri = breakpoints.binary_search(&r).expect("r was inserted above");
        coverage[li] += 1;
        if ri < coverage.len() {
            coverage[ri] -= 1;
        }
    }
    for i in 1..coverage.len() {
        coverage[i] += coverage[i - 1];
    }

    let mut start_time = breakpoints[0];
    for i in 0..breakpoints.len() - 1 {
        if coverage[i] != 0 {
            start_time = breakpoints[i + 1];
        } else if breakpoints[i + 1] - start_time >= duration {
            return start_time;
        }
    }

    start_time
}

/// Attempts to place `job` on `nodes`, mutating both the job and whichever
/// nodes it touches. This is the placement decision: node selection,
/// earliest feasible start, and commit.
pub fn attempt_placement(job: &mut Job, nodes: &mut [Node], now: i64) -> Result<PlacementOutcome> {
    let chosen = select_candidate_nodes(nodes, &job.req, job.node_num);

    if chosen.len() < job.node_num {
        return Ok(PlacementOutcome::Infeasible { available: chosen.len() });
    }

    let mut infeasible = Vec::new();
    for &nid in &chosen {
        infeasible.extend(nodes[nid].map.query_infeasible_intervals(job.req, now));
    }

    let start_time = earliest_feasible_start(now, job.predict_time, &infeasible);

    if start_time < now {
        return Err(Error::InvariantViolation(format!("computed start {} precedes NOW {} for job {}", start_time, now, job.id)));
    }

    for &nid in &chosen {
        nodes[nid].map.reserve(job.req, start_time, start_time + job.predict_time, nodes[nid].total)?;
    }

    if start_time == now {
        job.start_time = start_time;
        job.assigned_nodes = chosen.clone();
        for &nid in &chosen {
            nodes[nid].start_job(job);
        }
        Ok(PlacementOutcome::Started)
    } else {
        // The tentative reservations above are discarded automatically when
        // `rebuild_map` runs from the running set on the next tick.
        job.start_time = -1;
        job.assigned_nodes.clear();
        Ok(PlacementOutcome::Deferred)
    }
}

pub fn report_infeasible(job: &Job, available: usize) -> Error {
    Error::InfeasibleJob { job_id: job.id, node_num: job.node_num, req: job.req, available }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: usize, total: Resource) -> Node {
        Node::new(id, total)
    }

    #[test]
    fn immediate_placement_when_capacity_free() {
        let mut nodes = vec![node(0, Resource::new(8, 32))];
        let mut job = Job::new(1, 0, 10, 10, 1, Resource::new(4, 0), 10, 0);

        let outcome = attempt_placement(&mut job, &mut nodes, 0).unwrap();
        assert_eq!(outcome, PlacementOutcome::Started);
        assert_eq!(job.start_time, 0);
        assert_eq!(job.assigned_nodes, vec![0]);
    }

    #[test]
    fn serializes_when_capacity_is_exhausted() {
        // S2: one node of (8,32), two jobs each needing the whole CPU.
        let mut nodes = vec![node(0, Resource::new(8, 32))];
        let mut j1 = Job::new(1, 0, 10, 10, 1, Resource::new(8, 0), 10, 0);
        attempt_placement(&mut j1, &mut nodes, 0).unwrap();

        let mut j2 = Job::new(2, 0, 10, 10, 1, Resource::new(8, 0), 10, 0);
        let outcome = attempt_placement(&mut j2, &mut nodes, 0).unwrap();
        assert_eq!(outcome, PlacementOutcome::Deferred);
    }

    #[test]
    fn infeasible_job_is_reported_not_retried() {
        // S6: request exceeds node total outright.
        let mut nodes = vec![node(0, Resource::new(8, 32))];
        let mut job = Job::new(1, 0, 10, 10, 1, Resource::new(16, 0), 10, 0);

        let outcome = attempt_placement(&mut job, &mut nodes, 0).unwrap();
        assert_eq!(outcome, PlacementOutcome::Infeasible { available: 0 });
    }

    #[test]
    fn backfill_honors_predict_time_not_submit_time() {
        // S3: two nodes occupied for 100s; a short job arriving at t=5
        // must wait for a node to free, even though its own duration is 10.
        let mut nodes = vec![node(0, Resource::new(8, 0)), node(1, Resource::new(8, 0))];
        let mut j1 = Job::new(1, 0, 100, 100, 1, Resource::new(8, 0), 100, 0);
        attempt_placement(&mut j1, &mut nodes, 0).unwrap();
        let mut j2 = Job::new(2, 0, 100, 100, 1, Resource::new(8, 0), 100, 0);
        attempt_placement(&mut j2, &mut nodes, 0).unwrap();

        for n in nodes.iter_mut() {
            n.rebuild_map([&j1, &j2]).unwrap();
        }

        let mut j3 = Job::new(3, 5, 10, 10, 1, Resource::new(8, 0), 10, 0);
        let outcome = attempt_placement(&mut j3, &mut nodes, 5).unwrap();
        assert_eq!(outcome, PlacementOutcome::Deferred);
    }
}
