/// Instantaneous memory totals from `/proc/meminfo`, in KiB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryCounterSnapshot {
    pub total_kb: u64,
    pub free_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
}

impl MemoryCounterSnapshot {
    /// Memory not free and not reclaimable as buffers or page cache.
    pub fn used_kb(&self) -> u64 {
        let available = self
            .free_kb
            .saturating_add(self.buffers_kb)
            .saturating_add(self.cached_kb);
        self.total_kb.saturating_sub(available)
    }
}

/// Parse `label: value unit` lines, keeping `MemTotal`, `MemFree`,
/// `Buffers` and `Cached`. Absent or unparsable entries stay zero.
pub fn parse_memory_counters(text: &str) -> MemoryCounterSnapshot {
    let mut snapshot = MemoryCounterSnapshot::default();

    for line in text.lines() {
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match label.trim() {
            "MemTotal" => &mut snapshot.total_kb,
            "MemFree" => &mut snapshot.free_kb,
            "Buffers" => &mut snapshot.buffers_kb,
            "Cached" => &mut snapshot.cached_kb,
            _ => continue,
        };
        match rest.split_whitespace().next().map(str::parse::<u64>) {
            Some(Ok(value)) => *slot = value,
            _ => tracing::debug!(line, "unparsable meminfo value, using 0"),
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
MemTotal:       16303428 kB
MemFree:         8123456 kB
MemAvailable:   12000000 kB
Buffers:          345678 kB
Cached:          2345678 kB
SwapCached:            0 kB
Active:          4000000 kB
";

    #[test]
    fn extracts_the_four_labels() {
        let snapshot = parse_memory_counters(SAMPLE);
        assert_eq!(
            snapshot,
            MemoryCounterSnapshot {
                total_kb: 16_303_428,
                free_kb: 8_123_456,
                buffers_kb: 345_678,
                cached_kb: 2_345_678,
            }
        );
    }

    #[test]
    fn swap_cached_does_not_shadow_cached() {
        let snapshot = parse_memory_counters("SwapCached: 99 kB\nCached: 7 kB\n");
        assert_eq!(snapshot.cached_kb, 7);
    }

    #[test]
    fn missing_labels_default_to_zero() {
        let snapshot = parse_memory_counters("MemTotal: 1000 kB\n");
        assert_eq!(snapshot.total_kb, 1000);
        assert_eq!(snapshot.free_kb, 0);
        assert_eq!(snapshot.buffers_kb, 0);
        assert_eq!(snapshot.cached_kb, 0);
    }

    #[test]
    fn garbage_value_defaults_to_zero() {
        let snapshot = parse_memory_counters("MemTotal: lots kB\nMemFree: 10 kB\n");
        assert_eq!(snapshot.total_kb, 0);
        assert_eq!(snapshot.free_kb, 10);
    }

    #[test]
    fn used_never_underflows() {
        let snapshot = MemoryCounterSnapshot {
            total_kb: 100,
            free_kb: 80,
            buffers_kb: 30,
            cached_kb: 0,
        };
        assert_eq!(snapshot.used_kb(), 0);
    }
}
