use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tokio::sync::watch;

use crate::config::MetricsConfig;
use crate::format::Point;
use crate::publish::Publish;
use crate::system::{
    CounterSource, CpuCounterSnapshot, MemoryCounterSnapshot, Usage, cpu_utilization,
    memory_utilization, parse_cpu_counters, parse_memory_counters,
};

/// Fixed gap between two acquisitions.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(2);

/// Tag value for the all-cores figure.
pub const TOTAL_TAG: &str = "all";

/// One kind of metric the sampler can drive: how to parse a snapshot and
/// how to turn snapshots into points.
pub trait MetricFamily {
    type Snapshot;

    fn name(&self) -> &'static str;

    fn parse(&self, text: &str) -> Self::Snapshot;

    /// Points for the interval ending at `curr`. Returns `None` while the
    /// family still needs an earlier snapshot to compare against.
    fn derive(&self, prev: Option<&Self::Snapshot>, curr: &Self::Snapshot) -> Option<Vec<Point>>;
}

#[derive(Debug, Clone)]
pub struct CpuFamily {
    measurement: String,
    include_total: bool,
}

impl CpuFamily {
    pub fn new(measurement: impl Into<String>, include_total: bool) -> Self {
        Self {
            measurement: measurement.into(),
            include_total,
        }
    }

    pub fn from_config(metrics: &MetricsConfig) -> Self {
        Self::new(&metrics.cpu_measurement, metrics.include_total)
    }
}

impl MetricFamily for CpuFamily {
    type Snapshot = CpuCounterSnapshot;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn parse(&self, text: &str) -> CpuCounterSnapshot {
        parse_cpu_counters(text)
    }

    fn derive(
        &self,
        prev: Option<&CpuCounterSnapshot>,
        curr: &CpuCounterSnapshot,
    ) -> Option<Vec<Point>> {
        let usage = cpu_utilization(prev?, curr);

        let mut points = Vec::with_capacity(usage.cores.len() + 1);
        for core in &usage.cores {
            let label = format!("cpu{}", core.core);
            if let Some(point) = self.point(&label, core.usage) {
                points.push(point);
            }
        }
        if self.include_total
            && let Some(total) = usage.total
            && let Some(point) = self.point(TOTAL_TAG, total)
        {
            points.push(point);
        }
        Some(points)
    }
}

impl CpuFamily {
    fn point(&self, label: &str, usage: Usage) -> Option<Point> {
        match usage {
            Usage::Percent(value) => {
                tracing::info!("{label} usage is {value:.2}%");
                Some(Point::usage(&self.measurement, label, value))
            }
            sentinel => {
                tracing::debug!(label, ?sentinel, "no valid sample this interval");
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryFamily {
    measurement: String,
}

impl MemoryFamily {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
        }
    }

    pub fn from_config(metrics: &MetricsConfig) -> Self {
        Self::new(&metrics.memory_measurement)
    }
}

impl MetricFamily for MemoryFamily {
    type Snapshot = MemoryCounterSnapshot;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn parse(&self, text: &str) -> MemoryCounterSnapshot {
        parse_memory_counters(text)
    }

    // Memory totals are instantaneous, so the previous snapshot is unused.
    fn derive(
        &self,
        _prev: Option<&MemoryCounterSnapshot>,
        curr: &MemoryCounterSnapshot,
    ) -> Option<Vec<Point>> {
        match memory_utilization(curr) {
            Usage::Percent(value) => {
                tracing::info!("RAM usage is {value:.2}%");
                Some(vec![Point::usage(&self.measurement, "ram", value)])
            }
            sentinel => {
                tracing::debug!(?sentinel, "no valid memory sample");
                Some(Vec::new())
            }
        }
    }
}

/// Cooperative stop signal checked between cycles.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Shutdown(rx))
    }

    pub fn is_requested(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown is requested. If every sender is gone no
    /// request can arrive, so this never resolves.
    pub async fn requested(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Drives acquire, compute and publish for one metric family.
///
/// The snapshot read in cycle N is kept as the previous snapshot for cycle
/// N+1, so every tick costs a single read of the source.
pub struct Sampler<S, F, P> {
    source: S,
    family: F,
    publisher: P,
    interval: Duration,
    max_cycles: Option<u64>,
}

impl<S, F, P> Sampler<S, F, P>
where
    S: CounterSource,
    F: MetricFamily,
    P: Publish,
{
    pub fn new(source: S, family: F, publisher: P) -> Self {
        Self {
            source,
            family,
            publisher,
            interval: SAMPLE_INTERVAL,
            max_cycles: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after this many computed cycles. Priming reads do not count.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    fn acquire(&self) -> Result<F::Snapshot> {
        let text = self
            .source
            .read()
            .wrap_err_with(|| format!("failed to read {}", self.source.describe()))?;
        Ok(self.family.parse(&text))
    }

    /// Run until shutdown is requested or the cycle limit is reached.
    ///
    /// Returns the number of computed cycles. An unreadable source ends the
    /// run with an error; publish failures are logged and the loop goes on.
    #[tracing::instrument(name = "sample", skip_all, fields(family = self.family.name()))]
    pub async fn run(self, mut shutdown: Shutdown) -> Result<u64> {
        let mut prev: Option<F::Snapshot> = None;
        let mut cycles = 0u64;

        while !shutdown.is_requested() {
            let curr = self.acquire()?;

            if let Some(points) = self.family.derive(prev.as_ref(), &curr) {
                cycles += 1;
                self.ship(&points).await;
            }
            prev = Some(curr);

            if self.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.requested() => break,
            }
        }

        tracing::debug!(cycles, "sampler stopped");
        Ok(cycles)
    }

    async fn ship(&self, points: &[Point]) {
        if points.is_empty() {
            tracing::debug!("nothing to publish this cycle");
            return;
        }
        match self.publisher.publish(points).await {
            Ok(()) => tracing::debug!(records = points.len(), "data uploaded successfully"),
            Err(err) => tracing::warn!(error = %err, "publish failed, will retry next cycle"),
        }
    }
}
