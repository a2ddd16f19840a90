pub mod cpu;
pub mod memory;
pub mod source;
pub mod usage;

pub use cpu::{CoreCounters, CpuCounterSnapshot, CpuTimes, parse_cpu_counters};
pub use memory::{MemoryCounterSnapshot, parse_memory_counters};
pub use source::{CounterSource, FileSource};
pub use usage::{CoreUsage, CpuUsage, Usage, cpu_utilization, memory_utilization};
