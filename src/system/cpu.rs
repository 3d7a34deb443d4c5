use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::sample::{CpuSample, MetricKind};
use super::source::{MetricSource, SourceError};

/// Cumulative time counters from the aggregate `cpu` line of `/proc/stat`,
/// in USER_HZ ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuTimes {
    fn counters(&self) -> [u64; 7] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
        ]
    }

    /// Sum of every counter, or `None` if it does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        self.counters()
            .into_iter()
            .try_fold(0u64, |sum, counter| sum.checked_add(counter))
    }

    pub fn total(&self) -> u64 {
        self.counters()
            .into_iter()
            .fold(0u64, |sum, counter| sum.saturating_add(counter))
    }

    pub fn busy(&self) -> u64 {
        self.total().saturating_sub(self.idle)
    }

    /// Finds the aggregate `cpu` line in the contents of `/proc/stat`.
    pub fn from_stat(contents: &str) -> Result<Self, String> {
        contents
            .lines()
            .find(|line| line.split_whitespace().next() == Some("cpu"))
            .ok_or_else(|| "no aggregate cpu line".to_string())?
            .parse()
    }
}

impl FromStr for CpuTimes {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace().skip(1).map(|field| {
            field
                .parse::<u64>()
                .map_err(|e| format!("invalid counter {field:?}: {e}"))
        });
        let mut next = || {
            fields
                .next()
                .unwrap_or_else(|| Err("some fields are missing from the cpu line".to_string()))
        };

        let times = CpuTimes {
            user: next()?,
            nice: next()?,
            system: next()?,
            idle: next()?,
            iowait: next()?,
            irq: next()?,
            softirq: next()?,
        };
        match times.checked_total() {
            Some(_) => Ok(times),
            None => Err("cpu counters overflow when summed".to_string()),
        }
    }
}

/// Share of non-idle time between two readings, in percent.
///
/// Identical readings (no elapsed ticks) yield exactly zero.
pub fn utilization_between(before: CpuTimes, after: CpuTimes) -> f32 {
    let total = after.total().saturating_sub(before.total());
    if total == 0 {
        return 0.0;
    }
    let busy = after.busy().saturating_sub(before.busy());
    let percent = 100.0 * busy as f64 / total as f64;
    percent.clamp(0.0, 100.0) as f32
}

/// Extracts the physical core count from `/proc/cpuinfo`.
///
/// Uses the first `cpu cores` entry; kernels that omit it (most non-x86
/// targets) get the number of `processor` entries instead.
pub fn core_count(cpuinfo: &str) -> Option<u32> {
    let field = |line: &str, key: &str| -> Option<String> {
        let (name, value) = line.split_once(':')?;
        (name.trim() == key).then(|| value.trim().to_string())
    };

    if let Some(cores) = cpuinfo
        .lines()
        .find_map(|line| field(line, "cpu cores"))
        .and_then(|value| value.parse().ok())
    {
        return Some(cores);
    }

    let processors = cpuinfo
        .lines()
        .filter(|line| field(line, "processor").is_some())
        .count();
    (processors > 0).then_some(processors as u32)
}

/// Measures CPU utilization across a sampling window.
///
/// Keeps `/proc/cpuinfo` open for the life of the source and reopens the stat
/// file for each reading.
pub struct CpuSource {
    stat_path: PathBuf,
    cpuinfo_path: PathBuf,
    cpuinfo: Option<File>,
}

impl CpuSource {
    pub fn new(stat_path: impl Into<PathBuf>, cpuinfo_path: impl Into<PathBuf>) -> Self {
        CpuSource {
            stat_path: stat_path.into(),
            cpuinfo_path: cpuinfo_path.into(),
            cpuinfo: None,
        }
    }

    fn read_cores(&mut self) -> Result<u32, SourceError> {
        let path = &self.cpuinfo_path;
        let file = match self.cpuinfo.take() {
            Some(file) => file,
            None => File::open(path).map_err(|e| SourceError::io(path, e))?,
        };
        let file = self.cpuinfo.insert(file);

        let mut contents = String::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_string(&mut contents))
            .map_err(|e| SourceError::io(path, e))?;

        core_count(&contents).ok_or_else(|| SourceError::parse(path, "could not find # of cpu cores"))
    }

    fn read_times(path: &Path) -> Result<CpuTimes, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        CpuTimes::from_stat(&contents).map_err(|reason| SourceError::parse(path, reason))
    }
}

impl MetricSource for CpuSource {
    type Sample = CpuSample;

    const KIND: MetricKind = MetricKind::Cpu;

    async fn sample(&mut self, window: Duration) -> Result<CpuSample, SourceError> {
        let core_count = self.read_cores()?;

        let before = Self::read_times(&self.stat_path)?;
        tokio::time::sleep(window).await;
        let after = Self::read_times(&self.stat_path)?;

        Ok(CpuSample {
            core_count,
            utilization_percent: utilization_between(before, after),
        })
    }
}
