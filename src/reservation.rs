use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::resource::Resource;

/// Sentinel standing in for "+∞" on the time axis, matching the original
/// simulator's `INF` constant so the last breakpoint's interval is always
/// representable without an `Option`.
pub const INF: i64 = i64::MAX;

/// A piecewise-constant function `avail(t)` over `[0, ∞)`, stored as an
/// ordered map of breakpoints. `avail(t)` for `t` in `[k_i, k_{i+1})` equals
/// the value stored at `k_i`.
///
/// Invariants, checked after every mutation:
/// - non-empty, begins at key `0`
/// - every value in `[(0,0), total]`
/// - adjacent entries have distinct values
/// - the terminal entry's value equals `total`
#[derive(Debug, Clone)]
pub struct ReservationMap {
    breakpoints: BTreeMap<i64, Resource>,
}

impl ReservationMap {
    /// A fresh map with full capacity everywhere.
    pub fn new(total: Resource) -> Self {
        let mut breakpoints = BTreeMap::new();
        breakpoints.insert(0, total);
        ReservationMap { breakpoints }
    }

    /// Discards all reservations and reinserts one per `(start, end, req)`
    /// running job. Running jobs are planned against `timelimit`, not
    /// `predict_time` (see the scheduler's `rebuild` caller).
    pub fn rebuild<I>(&mut self, total: Resource, running: I) -> Result<()>
    where
        I: IntoIterator<Item = (i64, i64, Resource)>,
    {
        self.breakpoints.clear();
        self.breakpoints.insert(0, total);
        for (start, end, req) in running {
            self.reserve(req, start, end, total)?;
        }
        Ok(())
    }

    fn value_at(&self, t: i64) -> Resource {
        self.breakpoints.range(..=t).next_back().map(|(_, v)| *v).unwrap_or(Resource::ZERO)
    }

    fn ensure_breakpoint(&mut self, t: i64) {
        if !self.breakpoints.contains_key(&t) {
            let v = self.value_at(t);
            self.breakpoints.insert(t, v);
        }
    }

    /// Coalesces adjacent entries with equal values; the entry at key `0`
    /// is never removed even if an (impossible) predecessor would match it.
    fn coalesce(&mut self) {
        let keys: Vec<i64> = self.breakpoints.keys().copied().collect();
        let mut prev_val: Option<Resource> = None;
        for k in keys {
            let v = self.breakpoints[&k];
            if k != 0 {
                if let Some(pv) = prev_val {
                    if pv == v {
                        self.breakpoints.remove(&k);
                        continue;
                    }
                }
            }
            prev_val = Some(v);
        }
    }

    /// Subtracts `req` from `avail(t)` for `t` in `[l, r)`.
    pub fn reserve(&mut self, req: Resource, l: i64, r: i64, total: Resource) -> Result<()> {
        debug_assert!(l < r, "reservation window must be non-empty");

        self.ensure_breakpoint(l);
        self.ensure_breakpoint(r);

        let keys_in_range: Vec<i64> = self.breakpoints.range(l..r).map(|(k, _)| *k).collect();
        for k in keys_in_range {
            let v = self.breakpoints[&k];
            let updated = v - req;
            if updated.cpu < 0 || updated.mem < 0 {
                return Err(Error::InvariantViolation(format!(
                    "reservation of {:?} over [{}, {}) would drive avail negative at t={} (was {:?})",
                    req, l, r, k, v
                )));
            }
            self.breakpoints.insert(k, updated);
        }

        self.coalesce();

        let terminal = *self.breakpoints.values().next_back().expect("map is never empty");
        if terminal != total {
            return Err(Error::InvariantViolation(format!(
                "terminal breakpoint value {:?} does not equal node total {:?}",
                terminal, total
            )));
        }

        Ok(())
    }

    /// Adds `req` back over `[l, r)`, the inverse of `reserve`, used only to
    /// test the round-trip property; the scheduler itself never calls this
    /// directly because reservation maps are rebuilt from the running set
    /// each tick rather than mutated incrementally on release.
    #[cfg(test)]
    pub fn free(&mut self, req: Resource, l: i64, r: i64, total: Resource) -> Result<()> {
        self.reserve(Resource::new(-req.cpu, -req.mem), l, r, total)
    }

    /// Every maximal interval on which `avail(t) < req` (componentwise not
    /// `>=`), scanning from `from` onward and clipped to `[from, ∞)`. The
    /// rightmost interval may be unbounded, represented as `(l, INF)`.
    pub fn query_infeasible_intervals(&self, req: Resource, from: i64) -> Vec<(i64, i64)> {
        let keys: Vec<i64> = self.breakpoints.keys().copied().collect();
        let start_idx = match keys.binary_search(&from) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };

        let mut out = Vec::new();
        let mut open_start: Option<i64> = None;

        for idx in start_idx..keys.len() {
            let k = keys[idx];
            let v = self.breakpoints[&k];
            let seg_l = k.max(from);
            let seg_r = keys.get(idx + 1).copied().unwrap_or(INF);
            if seg_r <= from {
                continue;
            }

            if !v.covers(&req) {
                if open_start.is_none() {
                    open_start = Some(seg_l);
                }
            } else if let Some(s) = open_start.take() {
                out.push((s, seg_l));
            }
        }

        if let Some(s) = open_start {
            out.push((s, INF));
        }

        out
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<(i64, Resource)> {
        self.breakpoints.iter().map(|(k, v)| (*k, *v)).collect()
    }
}
