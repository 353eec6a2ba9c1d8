use crate::workload::WorkloadConfig;

/// Puts mixed with deletes of previously put keys.
pub struct PutDelete {
    count: u64,
    delete_ratio: f64,
}

impl PutDelete {
    pub fn new(count: u64, delete_ratio: f64) -> Self {
        PutDelete { count, delete_ratio }
    }
}

impl WorkloadConfig for PutDelete {
    fn get_name(&self) -> String {
        "PutDelete".to_owned()
    }

    fn get_operation_count(&self) -> u64 {
        self.count
    }

    fn get_delete_percent(&self) -> f64 {
        self.delete_ratio
    }
}
