use std::sync::Mutex;

use org_node_e2e::log::LogRecord;
use org_node_e2e::types::NodeRole;
use org_node_e2e::watch::RecordSink;

/// Sink that remembers every echoed record, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(NodeRole, LogRecord)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(NodeRole, LogRecord)> {
        self.records.lock().unwrap().clone()
    }

    /// Messages echoed for `role`, in order.
    pub fn messages(&self, role: NodeRole) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, rec)| rec.message.clone())
            .collect()
    }

    pub fn count(&self, role: NodeRole) -> usize {
        self.messages(role).len()
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, role: NodeRole, record: &LogRecord) {
        self.records.lock().unwrap().push((role, record.clone()));
    }
}
