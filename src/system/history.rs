use super::sample::{CpuSample, MemorySample};

/// Append-only history of one telemetry kind, in arrival order.
#[derive(Debug, Clone)]
pub struct Series<T> {
    entries: Vec<T>,
}

impl<T> Series<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.last()
    }

    /// The entry before the latest one.
    pub fn previous(&self) -> Option<&T> {
        self.entries.len().checked_sub(2).map(|i| &self.entries[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Each entry paired with the one before it (`None` for the first).
    pub fn with_previous(&self) -> impl Iterator<Item = (Option<&T>, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i.checked_sub(1).map(|p| &self.entries[p]), entry))
    }
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Memory and CPU histories for one dashboard run.
///
/// Both series grow by exactly one entry per completed iteration, so their
/// lengths never diverge.
#[derive(Debug, Default)]
pub struct SeriesStore {
    memory: Series<MemorySample>,
    cpu: Series<CpuSample>,
}

impl SeriesStore {
    /// Entries reserved up front; longer runs grow on demand.
    pub const PREALLOCATE_LIMIT: usize = 4096;

    pub fn new(expected: usize) -> Self {
        let capacity = expected.min(Self::PREALLOCATE_LIMIT);
        Self {
            memory: Series::with_capacity(capacity),
            cpu: Series::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, memory: MemorySample, cpu: CpuSample) {
        self.memory.push(memory);
        self.cpu.push(cpu);
    }

    pub fn memory(&self) -> &Series<MemorySample> {
        &self.memory
    }

    pub fn cpu(&self) -> &Series<CpuSample> {
        &self.cpu
    }

    pub fn iterations(&self) -> usize {
        self.memory.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(used: f32) -> MemorySample {
        MemorySample {
            physical_used_gib: used,
            physical_total_gib: 16.0,
            virtual_used_gib: used,
            virtual_total_gib: 18.0,
        }
    }

    fn cpu(percent: f32) -> CpuSample {
        CpuSample {
            core_count: 8,
            utilization_percent: percent,
        }
    }

    #[test]
    fn record_keeps_series_in_step() {
        let mut store = SeriesStore::new(3);
        store.record(memory(1.0), cpu(10.0));
        store.record(memory(2.0), cpu(20.0));
        assert_eq!(store.memory().len(), 2);
        assert_eq!(store.cpu().len(), 2);
        assert_eq!(store.iterations(), 2);
    }

    #[test]
    fn huge_expected_length_does_not_preallocate() {
        let mut store = SeriesStore::new(usize::MAX);
        store.record(memory(1.0), cpu(1.0));
        assert_eq!(store.iterations(), 1);
    }

    #[test]
    fn latest_and_previous_follow_insertion_order() {
        let mut series = Series::default();
        assert!(series.latest().is_none());
        series.push(1);
        assert_eq!(series.latest(), Some(&1));
        assert_eq!(series.previous(), None);
        series.push(2);
        series.push(3);
        assert_eq!(series.latest(), Some(&3));
        assert_eq!(series.previous(), Some(&2));
        assert_eq!(series.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn with_previous_pairs_neighbours() {
        let mut series = Series::default();
        for i in 0..3 {
            series.push(i);
        }
        let pairs: Vec<_> = series
            .with_previous()
            .map(|(prev, cur)| (prev.copied(), *cur))
            .collect();
        assert_eq!(pairs, vec![(None, 0), (Some(0), 1), (Some(1), 2)]);
    }
}
