use std::collections::HashMap;

use super::cpu::{CpuCounterSnapshot, CpuTimes};
use super::memory::MemoryCounterSnapshot;

/// Outcome of a utilization computation.
///
/// Anything other than `Percent` marks an interval where no meaningful
/// number exists; callers must not substitute a value of their own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Usage {
    Percent(f64),
    /// No ticks elapsed between the two samples.
    ZeroInterval,
    /// A counter went backwards, usually because the host rebooted.
    CounterReset,
    /// The source reported zero total memory.
    NoCapacity,
}

impl Usage {
    pub fn percent(self) -> Option<f64> {
        match self {
            Usage::Percent(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoreUsage {
    pub core: usize,
    pub usage: Usage,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpuUsage {
    /// One entry per core present in both samples, in current-snapshot order.
    pub cores: Vec<CoreUsage>,
    /// All-cores figure, when both snapshots carried the summary line.
    pub total: Option<Usage>,
}

/// Busy share of the ticks elapsed between `prev` and `curr`.
pub fn interval_usage(prev: &CpuTimes, curr: &CpuTimes) -> Usage {
    let (Some(busy), Some(waiting)) = (
        curr.busy().checked_sub(prev.busy()),
        curr.waiting().checked_sub(prev.waiting()),
    ) else {
        return Usage::CounterReset;
    };

    let elapsed = busy.saturating_add(waiting);
    if elapsed == 0 {
        return Usage::ZeroInterval;
    }
    Usage::Percent(busy as f64 / elapsed as f64 * 100.0)
}

/// Per-core utilization between two snapshots.
///
/// Cores are paired by their `cpu<N>` index, not by list position, so a CPU
/// going offline in the middle of the list does not shift its neighbours.
/// Only cores present in both samples are reported.
pub fn cpu_utilization(prev: &CpuCounterSnapshot, curr: &CpuCounterSnapshot) -> CpuUsage {
    if prev.core_count() != curr.core_count() {
        tracing::warn!(
            previous = prev.core_count(),
            current = curr.core_count(),
            "core count changed between samples, reporting common cores only"
        );
    }

    let previous: HashMap<usize, &CpuTimes> =
        prev.cores.iter().map(|c| (c.core, &c.times)).collect();
    let cores = curr
        .cores
        .iter()
        .filter_map(|after| {
            let before = previous.get(&after.core)?;
            Some(CoreUsage {
                core: after.core,
                usage: interval_usage(before, &after.times),
            })
        })
        .collect();

    let total = match (&prev.aggregate, &curr.aggregate) {
        (Some(before), Some(after)) => Some(interval_usage(before, after)),
        _ => None,
    };

    CpuUsage { cores, total }
}

/// Share of memory in use, excluding buffers and page cache.
pub fn memory_utilization(snapshot: &MemoryCounterSnapshot) -> Usage {
    if snapshot.total_kb == 0 {
        return Usage::NoCapacity;
    }
    Usage::Percent(snapshot.used_kb() as f64 / snapshot.total_kb as f64 * 100.0)
}
