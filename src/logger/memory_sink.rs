use super::{AnalysisLogEntry, AnalysisLogSink};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

pub struct MemoryLogSink {
    buffer: Arc<RwLock<VecDeque<AnalysisLogEntry>>>,
    capacity: usize,
}

impl MemoryLogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn get_recent(&self) -> Vec<AnalysisLogEntry> {
        let buffer = self.buffer.read().unwrap();
        buffer.iter().cloned().collect()
    }

    // Allow sharing the buffer with API handlers
    pub fn clone_buffer(&self) -> Arc<RwLock<VecDeque<AnalysisLogEntry>>> {
        self.buffer.clone()
    }
}

impl AnalysisLogSink for MemoryLogSink {
    fn log(&self, entry: &AnalysisLogEntry) {
        let mut buffer = self.buffer.write().unwrap();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry.clone());
    }
}
