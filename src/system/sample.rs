use std::fmt;

/// Which of the three fixed telemetry roles a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Memory,
    Sessions,
    Cpu,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Memory, MetricKind::Sessions, MetricKind::Cpu];

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Memory => "memory",
            MetricKind::Sessions => "sessions",
            MetricKind::Cpu => "cpu",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reading of system-wide memory, in GiB.
///
/// `used <= total` usually holds but is not enforced; swap accounting can
/// briefly break it and the value is reported as observed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MemorySample {
    pub physical_used_gib: f32,
    pub physical_total_gib: f32,
    pub virtual_used_gib: f32,
    pub virtual_total_gib: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CpuSample {
    pub core_count: u32,
    /// Share of non-idle time across the sampling window, in `[0, 100]`.
    pub utilization_percent: f32,
}

impl CpuSample {
    pub fn utilization_fraction(&self) -> f32 {
        self.utilization_percent / 100.0
    }
}

/// The active logins at one point in time. Each snapshot replaces the last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub sessions: Vec<String>,
}

impl SessionSnapshot {
    pub fn new(sessions: Vec<String>) -> Self {
        Self { sessions }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sessions.iter().map(String::as_str)
    }
}
