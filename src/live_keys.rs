use rand::Rng;

/// Keys that have been put and not yet deleted. Duplicates are kept as separate entries.
#[derive(Debug, Default)]
pub struct LiveKeys {
    keys: Vec<String>,
}

impl LiveKeys {
    pub fn push(&mut self, key: String) {
        self.keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Removes and returns a uniformly chosen key. Remaining keys keep their order.
    pub fn take_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.keys.len());
        Some(self.keys.remove(idx))
    }
}
