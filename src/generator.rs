use anyhow::{Result, ensure};
use rand::Rng;
use rand::distr::{Alphanumeric, Distribution, Uniform};
use std::ops::RangeInclusive;

/// Random `[A-Za-z0-9]` strings with a length drawn uniformly from an inclusive range.
pub struct AlnumGen {
    len: Uniform<usize>,
}

impl AlnumGen {
    pub fn new(range: RangeInclusive<usize>) -> Result<Self> {
        ensure!(
            !range.is_empty(),
            "Length range {}..={} is empty",
            range.start(),
            range.end()
        );
        let len = Uniform::new_inclusive(*range.start(), *range.end())?;
        Ok(AlnumGen { len })
    }

    pub fn get_string<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let size = self.len.sample(rng);
        (0..size).map(|_| char::from(Alphanumeric.sample(rng))).collect()
    }
}
