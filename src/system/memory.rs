use std::time::Duration;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use super::sample::{MemorySample, MetricKind};
use super::source::{MetricSource, SourceError};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Raw memory counters in bytes, as reported by the kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    pub ram_total: u64,
    pub ram_free: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

impl MemoryCounters {
    /// Virtual memory is RAM plus swap, both for the total and the used share.
    pub fn to_sample(self) -> MemorySample {
        let gib = |bytes: u64| (bytes as f64 / GIB) as f32;

        let physical_total_gib = gib(self.ram_total);
        let physical_used_gib = physical_total_gib - gib(self.ram_free);
        let swap_total_gib = gib(self.swap_total);

        MemorySample {
            physical_used_gib,
            physical_total_gib,
            virtual_used_gib: swap_total_gib - gib(self.swap_free) + physical_used_gib,
            virtual_total_gib: swap_total_gib + physical_total_gib,
        }
    }
}

pub struct MemorySource {
    sys: System,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );
        MemorySource { sys }
    }

    pub fn read(&mut self) -> MemoryCounters {
        let _span = tracing::trace_span!("memory.refresh").entered();

        self.sys.refresh_memory();
        MemoryCounters {
            ram_total: self.sys.total_memory(),
            ram_free: self.sys.free_memory(),
            swap_total: self.sys.total_swap(),
            swap_free: self.sys.free_swap(),
        }
    }
}

impl MetricSource for MemorySource {
    type Sample = MemorySample;

    const KIND: MetricKind = MetricKind::Memory;

    async fn sample(&mut self, _window: Duration) -> Result<MemorySample, SourceError> {
        Ok(self.read().to_sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn virtual_memory_includes_swap() {
        let counters = MemoryCounters {
            ram_total: 8 * ONE_GIB,
            ram_free: 2 * ONE_GIB,
            swap_total: 4 * ONE_GIB,
            swap_free: 3 * ONE_GIB,
        };
        let sample = counters.to_sample();
        assert_eq!(sample.physical_total_gib, 8.0);
        assert_eq!(sample.physical_used_gib, 6.0);
        assert_eq!(sample.virtual_total_gib, 12.0);
        assert_eq!(sample.virtual_used_gib, 7.0);
    }

    #[test]
    fn no_swap_keeps_virtual_equal_to_physical() {
        let counters = MemoryCounters {
            ram_total: 2 * ONE_GIB,
            ram_free: ONE_GIB / 2,
            swap_total: 0,
            swap_free: 0,
        };
        let sample = counters.to_sample();
        assert_eq!(sample.virtual_total_gib, sample.physical_total_gib);
        assert_eq!(sample.virtual_used_gib, sample.physical_used_gib);
    }

    #[test]
    fn live_read_reports_nonzero_total() {
        let mut source = MemorySource::new();
        let counters = source.read();
        assert!(counters.ram_total > 0);
    }
}
