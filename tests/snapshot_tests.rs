use cpuloads::format::encode_batch;
use cpuloads::sampler::{CpuFamily, MemoryFamily, MetricFamily};
use insta::assert_snapshot;

const STAT_BEFORE: &str = "\
cpu  400 40 200 3200 20 8 4 0 0 0
cpu0 100 10 50 800 5 2 1 0 0 0
cpu1 100 10 50 800 5 2 1 0 0 0
cpu2 100 10 50 800 5 2 1 0 0 0
cpu3 100 10 50 800 5 2 1 0 0 0
intr 12345 0 0
ctxt 987654
";

const STAT_AFTER: &str = "\
cpu  550 40 200 3500 20 8 4 0 0 0
cpu0 200 10 50 800 5 2 1 0 0 0
cpu1 125 10 50 875 5 2 1 0 0 0
cpu2 100 10 50 900 5 2 1 0 0 0
cpu3 100 10 50 800 5 2 1 0 0 0
intr 12399 0 0
ctxt 987700
";

#[test]
fn cpu_interval_line_protocol() {
    let family = CpuFamily::new("cpu", true);
    let prev = family.parse(STAT_BEFORE);
    let curr = family.parse(STAT_AFTER);
    let points = family.derive(Some(&prev), &curr).expect("cpu family needs two samples");

    // cpu3 did not advance and is left out.
    assert_snapshot!(encode_batch(&points), @r"
    cpu,core=cpu0 usage=100.000000
    cpu,core=cpu1 usage=25.000000
    cpu,core=cpu2 usage=0.000000
    cpu,core=all usage=33.333333
    ");
}

#[test]
fn memory_line_protocol() {
    let family = MemoryFamily::new("ram");
    let snapshot = family.parse(
        "MemTotal:       16000000 kB\nMemFree:         4000000 kB\nBuffers:          500000 kB\nCached:          1500000 kB\n",
    );
    let points = family.derive(None, &snapshot).expect("memory needs one sample");
    assert_snapshot!(encode_batch(&points), @"ram,core=ram usage=62.500000");
}
