pub mod put_delete;
pub mod put_only;

use crate::generator::AlnumGen;
use crate::live_keys::LiveKeys;
use anyhow::{Result, ensure};
use rand::Rng;
use rand::rngs::SmallRng;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use thousands::Separable;

const DELETE_PREFIX: &str = "\\delete ";

/// One line of a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Put { key: String, value: String },
    Delete { key: String },
}

impl Operation {
    /// Length of the rendered line, newline included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Operation::Put { key, value } => key.len() + 1 + value.len() + 1,
            Operation::Delete { key } => DELETE_PREFIX.len() + key.len() + 1,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Put { key, value } => write!(f, "{key}={value}"),
            Operation::Delete { key } => write!(f, "{DELETE_PREFIX}{key}"),
        }
    }
}

#[derive(Debug)]
pub struct WorkloadStats {
    name: String,
    puts: u64,
    deletes: u64,
    live_keys: u64,
    bytes: u64,
    time: Duration,
}

impl WorkloadStats {
    pub fn new(name: String) -> Self {
        WorkloadStats {
            name,
            puts: 0,
            deletes: 0,
            live_keys: 0,
            bytes: 0,
            time: Duration::ZERO,
        }
    }

    pub fn ops(&self) -> u64 {
        self.puts + self.deletes
    }

    pub fn puts(&self) -> u64 {
        self.puts
    }

    pub fn deletes(&self) -> u64 {
        self.deletes
    }

    pub fn live_keys(&self) -> u64 {
        self.live_keys
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Display for WorkloadStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let throughput = if self.ops() == 0 || self.time.is_zero() {
            0
        } else {
            (self.ops() as f64 / self.time.as_secs_f64()) as u64
        };

        writeln!(f, "=== {} ===", self.name)?;
        writeln!(
            f,
            "ops: {} | puts: {} | deletes: {} | live keys: {}",
            self.ops().separate_with_underscores(),
            self.puts.separate_with_underscores(),
            self.deletes.separate_with_underscores(),
            self.live_keys.separate_with_underscores()
        )?;
        write!(
            f,
            "bytes: {} | time: {:.1?} | throughput: {} ops/s",
            self.bytes.separate_with_underscores(),
            self.time,
            throughput.separate_with_underscores()
        )
    }
}

pub trait WorkloadConfig {
    fn get_name(&self) -> String;
    /// How many operations to emit
    fn get_operation_count(&self) -> u64;
    /// Chance that an operation is a delete, when there is a live key to delete
    fn get_delete_percent(&self) -> f64;

    fn get_key_size_range(&self) -> RangeInclusive<usize> {
        3..=10
    }

    fn get_value_size_range(&self) -> RangeInclusive<usize> {
        5..=15
    }
}

pub trait Workload {
    /// Writes the whole trace to `out`, one line per operation.
    fn exec(&self, rng: &mut SmallRng, out: &mut dyn Write) -> Result<WorkloadStats>;

    fn get_name(&self) -> String;
}

impl<T: WorkloadConfig> Workload for T {
    fn exec(&self, rng: &mut SmallRng, out: &mut dyn Write) -> Result<WorkloadStats> {
        validate_config(self)?;
        let mut stats = WorkloadStats::new(WorkloadConfig::get_name(self));
        let start = Instant::now();

        let mut ops = OpStream::new(self, rng)?;
        for op in ops.by_ref() {
            writeln!(out, "{op}")?;
            stats.bytes += op.encoded_len() as u64;
        }
        out.flush()?;

        stats.time = start.elapsed();
        stats.puts = ops.puts();
        stats.deletes = ops.deletes();
        stats.live_keys = ops.live_keys() as u64;
        Ok(stats)
    }

    fn get_name(&self) -> String {
        WorkloadConfig::get_name(self)
    }
}

/// Yields exactly `get_operation_count()` operations, drawing from the borrowed rng.
pub struct OpStream<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    keys: AlnumGen,
    values: AlnumGen,
    live: LiveKeys,
    delete_percent: f64,
    remaining: u64,
    puts: u64,
    deletes: u64,
}

impl<'a, R: Rng + ?Sized> OpStream<'a, R> {
    pub fn new(config: &impl WorkloadConfig, rng: &'a mut R) -> Result<Self> {
        Ok(OpStream {
            rng,
            keys: AlnumGen::new(config.get_key_size_range())?,
            values: AlnumGen::new(config.get_value_size_range())?,
            live: LiveKeys::default(),
            delete_percent: config.get_delete_percent(),
            remaining: config.get_operation_count(),
            puts: 0,
            deletes: 0,
        })
    }

    pub fn puts(&self) -> u64 {
        self.puts
    }

    pub fn deletes(&self) -> u64 {
        self.deletes
    }

    /// Keys currently eligible for deletion.
    pub fn live_keys(&self) -> usize {
        self.live.len()
    }

    fn next_delete(&mut self) -> Option<Operation> {
        if self.live.is_empty() || self.rng.random::<f64>() >= self.delete_percent {
            return None;
        }
        let key = self.live.take_random(&mut *self.rng)?;
        self.deletes += 1;
        Some(Operation::Delete { key })
    }

    fn next_put(&mut self) -> Operation {
        let key = self.keys.get_string(&mut *self.rng);
        let value = self.values.get_string(&mut *self.rng);
        self.live.push(key.clone());
        self.puts += 1;
        Operation::Put { key, value }
    }
}

impl<R: Rng + ?Sized> Iterator for OpStream<'_, R> {
    type Item = Operation;

    fn next(&mut self) -> Option<Operation> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(match self.next_delete() {
            Some(op) => op,
            None => self.next_put(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

fn validate_config(config: &impl WorkloadConfig) -> Result<()> {
    let p = config.get_delete_percent();
    ensure!(p.is_finite(), "Delete percent must be a finite number, got {p}");
    ensure!(p >= 0.0, "Delete percent must be larger than or equal to 0, got {p}");
    ensure!(p <= 1.0, "Delete percent must be less than or equal to 1, got {p}");

    for (what, r) in [
        ("Key", config.get_key_size_range()),
        ("Value", config.get_value_size_range()),
    ] {
        ensure!(!r.is_empty(), "{what} size range {}..={} is empty", r.start(), r.end());
        ensure!(*r.start() >= 1, "{what} size must be at least 1");
    }
    Ok(())
}
