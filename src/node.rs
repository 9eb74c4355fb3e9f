use std::collections::HashSet;

use crate::error::Result;
use crate::job::{Job, JobId};
use crate::reservation::ReservationMap;
use crate::resource::Resource;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub total: Resource,
    pub avail: Resource,
    pub running: HashSet<JobId>,
    pub map: ReservationMap,
}

impl Node {
    pub fn new(id: usize, total: Resource) -> Self {
        Node { id, total, avail: total, running: HashSet::new(), map: ReservationMap::new(total) }
    }

    /// Rebuilds `map` from scratch, reserving every running job over
    /// `[start_time, start_time + timelimit)`, the pessimistic horizon.
    /// Running jobs might overrun `predict_time` up to their `timelimit`,
    /// so that headroom is never promised away to a newcomer.
    pub fn rebuild_map<'a, I>(&mut self, running_jobs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Job>,
    {
        let reservations: Vec<(i64, i64, Resource)> =
            running_jobs.into_iter().filter(|j| self.running.contains(&j.id)).map(|j| (j.start_time, j.start_time + j.timelimit, j.req)).collect();

        self.map.rebuild(self.total, reservations)
    }

    /// Commits `job` as running on this node: decrements instantaneous
    /// `avail` and records it in the running set.
    pub fn start_job(&mut self, job: &Job) {
        self.avail = self.avail - job.req;
        self.running.insert(job.id);
    }

    /// Releases `job`'s instantaneous capacity back and drops it from the
    /// running set.
    pub fn end_job(&mut self, job: &Job) {
        self.avail = self.avail + job.req;
        self.running.remove(&job.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: JobId, start: i64, timelimit: i64, req: Resource) -> Job {
        let mut j = Job::new(id, 0, timelimit, timelimit, 1, req, timelimit, 0);
        j.start_time = start;
        j
    }

    #[test]
    fn start_and_end_job_restores_avail() {
        let mut n = Node::new(0, Resource::new(8, 32));
        let j = job(1, 0, 10, Resource::new(4, 0));

        n.start_job(&j);
        assert_eq!(n.avail, Resource::new(4, 32));

        n.end_job(&j);
        assert_eq!(n.avail, Resource::new(8, 32));
    }

    #[test]
    fn rebuild_map_uses_timelimit_not_predict_time() {
        let mut n = Node::new(0, Resource::new(8, 0));
        let mut j = job(1, 0, 100, Resource::new(8, 0));
        j.predict_time = 10;
        n.running.insert(j.id);

        n.rebuild_map(std::iter::once(&j)).unwrap();

        // still infeasible at t=50 (within timelimit) even though predict_time=10
        let intervals = n.map.query_infeasible_intervals(Resource::new(1, 0), 0);
        assert_eq!(intervals, vec![(0, 100)]);
    }
}
