/// Time spent in each CPU state since boot, in clock ticks.
///
/// Field order matches the columns of a `cpu` line in `/proc/stat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

const FIELD_COUNT: usize = 8;

impl CpuTimes {
    fn from_fields(fields: [u64; FIELD_COUNT]) -> Self {
        let [user, nice, system, idle, iowait, irq, softirq, steal] = fields;
        Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
        }
    }

    /// Ticks spent doing work: everything except idle and iowait.
    pub fn busy(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    pub fn waiting(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn total(&self) -> u64 {
        self.busy().saturating_add(self.waiting())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreCounters {
    /// Index from the `cpu<N>` label.
    pub core: usize,
    pub times: CpuTimes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuCounterSnapshot {
    /// Per-core entries in the order the source listed them.
    pub cores: Vec<CoreCounters>,
    /// The all-cores `cpu` summary line, when present.
    pub aggregate: Option<CpuTimes>,
}

impl CpuCounterSnapshot {
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }
}

enum Label {
    Aggregate,
    Core(usize),
}

fn parse_label(token: &str) -> Option<Label> {
    let suffix = token.strip_prefix("cpu")?;
    if suffix.is_empty() {
        return Some(Label::Aggregate);
    }
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().map(Label::Core)
}

/// Parse the text of `/proc/stat` into a snapshot.
///
/// Only lines labelled `cpu` or `cpu<N>` are considered. The first eight
/// numbers of each line are read; a missing or non-numeric column is taken
/// as zero so one bad field never drops the whole core.
pub fn parse_cpu_counters(text: &str) -> CpuCounterSnapshot {
    let mut snapshot = CpuCounterSnapshot::default();

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(label) = tokens.next().and_then(parse_label) else {
            continue;
        };

        let mut fields = [0u64; FIELD_COUNT];
        let mut seen = 0;
        for (slot, token) in fields.iter_mut().zip(tokens) {
            seen += 1;
            match token.parse() {
                Ok(value) => *slot = value,
                Err(_) => tracing::debug!(line, token, "non-numeric cpu counter, using 0"),
            }
        }
        if seen == 0 {
            continue;
        }
        if seen < FIELD_COUNT {
            tracing::debug!(line, seen, "short cpu line, missing counters set to 0");
        }

        let times = CpuTimes::from_fields(fields);
        match label {
            Label::Aggregate => snapshot.aggregate = Some(times),
            Label::Core(core) => snapshot.cores.push(CoreCounters { core, times }),
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cpu  400 40 200 3200 20 8 4 0 0 0
cpu0 100 10 50 800 5 2 1 0 0 0
cpu1 100 10 50 800 5 2 1 0 0 0
cpu2 100 10 50 800 5 2 1 0 0 0
cpu3 100 10 50 800 5 2 1 0 0 0
intr 12345 0 0
ctxt 987654
btime 1700000000
processes 4242
procs_running 2
procs_blocked 0
softirq 100 0 1 2 3 4 5 6 7 8
";

    #[test]
    fn parses_known_values_for_core_zero() {
        let snapshot = parse_cpu_counters("cpu0 100 10 50 800 5 2 1 0 0 0 0\n");
        assert_eq!(snapshot.core_count(), 1);
        let core = snapshot.cores[0];
        assert_eq!(core.core, 0);
        assert_eq!(
            core.times,
            CpuTimes {
                user: 100,
                nice: 10,
                system: 50,
                idle: 800,
                iowait: 5,
                irq: 2,
                softirq: 1,
                steal: 0,
            }
        );
    }

    #[test]
    fn aggregate_line_is_kept_apart_from_cores() {
        let snapshot = parse_cpu_counters(SAMPLE);
        assert_eq!(snapshot.core_count(), 4);
        assert_eq!(snapshot.aggregate.map(|t| t.user), Some(400));
        let indices: Vec<usize> = snapshot.cores.iter().map(|c| c.core).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let snapshot = parse_cpu_counters("intr 1 2 3\nsoftirq 1 2 3 4 5 6 7 8\ncpufreq 1 2\n");
        assert!(snapshot.cores.is_empty());
        assert!(snapshot.aggregate.is_none());
    }

    #[test]
    fn multi_digit_core_indices() {
        let text: String = (0..12)
            .map(|i| format!("cpu{i} {i} 0 0 10 0 0 0 0 0 0\n"))
            .collect();
        let snapshot = parse_cpu_counters(&text);
        assert_eq!(snapshot.core_count(), 12);
        assert_eq!(snapshot.cores[11].core, 11);
        assert_eq!(snapshot.cores[11].times.user, 11);
    }

    #[test]
    fn malformed_fields_default_to_zero() {
        let snapshot = parse_cpu_counters("cpu0 100 x 50 800\n");
        let times = snapshot.cores[0].times;
        assert_eq!(times.user, 100);
        assert_eq!(times.nice, 0);
        assert_eq!(times.system, 50);
        assert_eq!(times.idle, 800);
        assert_eq!(times.steal, 0);
    }

    #[test]
    fn label_without_counters_is_skipped() {
        let snapshot = parse_cpu_counters("cpu0\ncpu1 1 2 3 4 5 6 7 8\n");
        assert_eq!(snapshot.core_count(), 1);
        assert_eq!(snapshot.cores[0].core, 1);
    }

    #[test]
    fn busy_excludes_idle_and_iowait() {
        let times = CpuTimes {
            user: 100,
            nice: 10,
            system: 50,
            idle: 800,
            iowait: 5,
            irq: 2,
            softirq: 1,
            steal: 0,
        };
        assert_eq!(times.busy(), 163);
        assert_eq!(times.total(), 968);
    }

    #[test]
    fn busy_saturates_instead_of_overflowing() {
        let times = CpuTimes {
            user: u64::MAX,
            nice: 1,
            ..CpuTimes::default()
        };
        assert_eq!(times.busy(), u64::MAX);
        assert_eq!(times.total(), u64::MAX);
    }
}
