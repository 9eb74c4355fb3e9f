use crate::resource::Resource;

pub type JobId = u64;
pub type NodeId = usize;

/// Tracked informally via which priority queue currently owns the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Arrived,
    Pending,
    Running,
    Ended,
    Dropped,
}

/// `predict_time` is within `[1, timelimit]`; `execution_time` is ground
/// truth, never exceeding `timelimit`. `start_time == -1` means unplaced.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub submit_time: i64,
    pub timelimit: i64,
    pub predict_time: i64,
    pub node_num: usize,
    pub req: Resource,
    pub execution_time: i64,
    pub priority: i64,

    pub start_time: i64,
    pub assigned_nodes: Vec<NodeId>,
    pub ended: bool,
    pub state: JobState,
}

impl Job {
    pub fn new(
        id: JobId,
        submit_time: i64,
        timelimit: i64,
        predict_time: i64,
        node_num: usize,
        req: Resource,
        execution_time: i64,
        priority: i64,
    ) -> Self {
        Job {
            id,
            submit_time,
            timelimit,
            predict_time,
            node_num,
            req,
            execution_time,
            priority,
            start_time: -1,
            assigned_nodes: Vec::new(),
            ended: false,
            state: JobState::Arrived,
        }
    }

    pub fn wait_time(&self) -> i64 {
        self.start_time - self.submit_time
    }

    /// `(wait + max(exec, 60)) / max(exec, 60)`, per the GLOSSARY.
    pub fn bounded_slowdown(&self) -> f64 {
        let floor = self.execution_time.max(60) as f64;
        (self.wait_time() as f64 + floor) / floor
    }
}
