use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use log::{debug, info, warn};

use crate::error::Result;
use crate::job::{Job, JobId, JobState};
use crate::node::Node;
use crate::placement::{attempt_placement, report_infeasible, PlacementOutcome};
use crate::policy::Policy;

/// How far the virtual clock advances per non-idle tick.
const SCHEDULE_TIME: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArrivalEntry {
    key: i64,
    id: JobId,
}

impl Eq for ArrivalEntry {}
impl PartialOrd for ArrivalEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ArrivalEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingEntry {
    key: f64,
    id: JobId,
}

impl Eq for PendingEntry {}
impl PartialOrd for PendingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PendingEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.total_cmp(&other.key).then_with(|| self.id.cmp(&other.id))
    }
}

type RunningEntry = ArrivalEntry;

/// The discrete-event driver: virtual clock, three policy-ordered queues,
/// and the fixed node fleet. One `tick()` call runs one iteration: mature
/// arrivals, reap completions, rebuild reservation maps, then place.
pub struct Scheduler {
    pub now: i64,
    pub nodes: Vec<Node>,
    pub jobs: HashMap<JobId, Job>,
    pub policy: Policy,
    arrivals: BinaryHeap<Reverse<ArrivalEntry>>,
    pending: BinaryHeap<Reverse<PendingEntry>>,
    running: BinaryHeap<Reverse<RunningEntry>>,
    pub dropped: Vec<JobId>,
}

impl Scheduler {
    /// Builds a scheduler over `nodes`, loading `jobs` into the arrival
    /// queue keyed by `submit_time` and setting `NOW` to the smallest
    /// submit time among them.
    pub fn new(nodes: Vec<Node>, jobs: Vec<Job>, policy: Policy) -> Self {
        let now = jobs.iter().map(|j| j.submit_time).min().unwrap_or(0);

        let mut arrivals = BinaryHeap::new();
        let mut job_map = HashMap::new();
        for job in jobs {
            arrivals.push(Reverse(ArrivalEntry { key: job.submit_time, id: job.id }));
            job_map.insert(job.id, job);
        }

        Scheduler { now, nodes, jobs: job_map, policy, arrivals, pending: BinaryHeap::new(), running: BinaryHeap::new(), dropped: Vec::new() }
    }

    pub fn is_done(&self) -> bool {
        self.arrivals.is_empty() && self.pending.is_empty() && self.running.is_empty()
    }

    /// Runs `tick()` until all three queues are empty.
    pub fn run(&mut self) -> Result<()> {
        while !self.is_done() {
            self.tick()?;
        }
        Ok(())
    }

    /// One iteration of the event loop: mature arrivals, reap completions,
    /// then plan.
    pub fn tick(&mut self) -> Result<()> {
        self.mature_arrivals();
        self.reap_completions();

        if self.pending.is_empty() {
            self.now += 1;
            return Ok(());
        }

        for node in &mut self.nodes {
            let jobs = &self.jobs;
            node.rebuild_map(jobs.values())?;
        }

        while let Some(Reverse(entry)) = self.pending.pop() {
            self.place_one(entry.id)?;
        }

        self.now += SCHEDULE_TIME;
        Ok(())
    }

    fn mature_arrivals(&mut self) {
        while let Some(Reverse(entry)) = self.arrivals.peek().copied() {
            if entry.key > self.now {
                break;
            }
            self.arrivals.pop();

            let job = self.jobs.get_mut(&entry.id).expect("arrival queue references a live job");
            job.state = JobState::Pending;
            let score = self.policy.score(job, self.now);
            self.pending.push(Reverse(PendingEntry { key: score, id: entry.id }));
        }
    }

    fn reap_completions(&mut self) {
        while let Some(Reverse(entry)) = self.running.peek().copied() {
            if entry.key > self.now {
                break;
            }
            self.running.pop();
            self.end_job(entry.id);
        }
    }

    fn place_one(&mut self, id: JobId) -> Result<()> {
        let mut job = self.jobs.remove(&id).expect("pending queue references a live job");
        let outcome = attempt_placement(&mut job, &mut self.nodes, self.now)?;

        match outcome {
            PlacementOutcome::Started => {
                info!("job {} started at {} on nodes {:?}", job.id, job.start_time, job.assigned_nodes);
                job.state = JobState::Running;
                self.running.push(Reverse(ArrivalEntry { key: job.start_time + job.execution_time, id: job.id }));
                self.jobs.insert(id, job);
            }
            PlacementOutcome::Deferred => {
                debug!("job {} deferred, re-queued at submit_time {}", job.id, job.submit_time);
                job.state = JobState::Arrived;
                self.arrivals.push(Reverse(ArrivalEntry { key: job.submit_time, id: job.id }));
                self.jobs.insert(id, job);
            }
            PlacementOutcome::Infeasible { available } => {
                let err = report_infeasible(&job, available);
                warn!("{}", err);
                job.state = JobState::Dropped;
                job.ended = false;
                self.dropped.push(job.id);
                self.jobs.insert(id, job);
            }
        }

        Ok(())
    }

    fn end_job(&mut self, id: JobId) {
        let mut job = self.jobs.remove(&id).expect("running queue references a live job");
        for &nid in &job.assigned_nodes {
            self.nodes[nid].end_job(&job);
        }
        job.ended = true;
        job.state = JobState::Ended;
        debug!("job {} ended at {}", job.id, self.now);
        self.jobs.insert(id, job);
    }

    /// Output records for every job, in the result-file text format. Dropped or
    /// never-placed jobs emit `ended = 0` and `start_time = -1`.
    pub fn output_records(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.id);
        jobs
    }
}
