use super::stat_reporter::*;
use super::stats_accumlator::StatsAccumulator;
use std::sync::Arc;
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct BaseCountReporter {
    pub name: String,
    pub value: u64,
}

impl BaseCountReporter {
    pub fn new(name: &str) -> Self {
        BaseCountReporter {
            name: name.to_string(),
            value: 0,
        }
    }
    pub fn add(&mut self, val: u64) {
        self.value += val;
    }
}

#[derive(Debug, Clone)]
struct CountReporter(BaseCountReporter);
impl CountReporter {
    pub fn new(name: &str) -> Self {
        CountReporter(BaseCountReporter::new(name))
    }
}
impl StatReporter for CountReporter {
    fn report(&self, accum: &mut StatsAccumulator) {
        accum.report_counter(&self.0.name, self.0.value);
    }
    fn clear(&mut self) {
        self.0.value = 0;
    }
    fn add_int(&mut self, val: u64) {
        self.0.add(val);
    }
}

#[derive(Debug, Clone)]
struct MemoryReporter(BaseCountReporter);
impl MemoryReporter {
    pub fn new(name: &str) -> Self {
        MemoryReporter(BaseCountReporter::new(name))
    }
}
impl StatReporter for MemoryReporter {
    fn report(&self, accum: &mut StatsAccumulator) {
        accum.report_memory_counter(&self.0.name, self.0.value);
    }
    fn clear(&mut self) {
        self.0.value = 0;
    }
    fn add_int(&mut self, val: u64) {
        self.0.add(val);
    }
}

//-----------------------------------------------------------------------

/// A named counter. Declare one per thread with `thread_local!`; the
/// registry sums counters that share a name when reporting.
pub struct StatCounter {
    reporter: Arc<RwLock<dyn StatReporter>>,
}

impl StatCounter {
    pub fn new(name: &str) -> Self {
        let reporter = Arc::new(RwLock::new(CountReporter::new(name)));
        register_stat_reporter(reporter.clone());
        StatCounter { reporter }
    }
    pub fn inc(&self) {
        self.add(1);
    }
    pub fn add(&self, val: u64) {
        let mut reporter = self.reporter.write().unwrap();
        reporter.add_int(val);
    }
}

pub struct StatMemoryCounter {
    reporter: Arc<RwLock<dyn StatReporter>>,
}

impl StatMemoryCounter {
    pub fn new(name: &str) -> Self {
        let reporter = Arc::new(RwLock::new(MemoryReporter::new(name)));
        register_stat_reporter(reporter.clone());
        StatMemoryCounter { reporter }
    }
    pub fn add(&self, val: usize) {
        let mut reporter = self.reporter.write().unwrap();
        reporter.add_int(val as u64);
    }
}
