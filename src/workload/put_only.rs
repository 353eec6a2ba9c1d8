use crate::workload::WorkloadConfig;

/// Every operation is a put.
pub struct PutOnly {
    count: u64,
}

impl PutOnly {
    pub fn new(count: u64) -> Self {
        PutOnly { count }
    }
}

impl WorkloadConfig for PutOnly {
    fn get_name(&self) -> String {
        "PutOnly".to_owned()
    }

    fn get_operation_count(&self) -> u64 {
        self.count
    }

    fn get_delete_percent(&self) -> f64 {
        0.0
    }
}
