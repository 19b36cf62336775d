use nanorand::{BufferedRng, Rng, WyRand};

/// Source of uniform random bytes, used by the `CXNN` instruction.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

/// Default source, backed by nanorand's WyRand.
pub struct WyRandSource {
    rng: BufferedRng<WyRand, 8>,
}

impl WyRandSource {
    /// Seeded from system entropy.
    pub fn new() -> Self {
        WyRandSource {
            rng: BufferedRng::new(WyRand::new()),
        }
    }

    /// Fixed seed, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        WyRandSource {
            rng: BufferedRng::new(WyRand::new_seed(seed)),
        }
    }
}

impl Default for WyRandSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for WyRandSource {
    fn next_byte(&mut self) -> u8 {
        let mut n = [0u8; 1];
        self.rng.fill(&mut n);
        n[0]
    }
}

/// Replays a fixed list of bytes, starting over when it runs out.
#[cfg(test)]
pub struct SequenceSource {
    bytes: Vec<u8>,
    next: usize,
}

#[cfg(test)]
impl SequenceSource {
    pub fn new(bytes: &[u8]) -> Self {
        SequenceSource {
            bytes: Vec::from(bytes),
            next: 0,
        }
    }
}

#[cfg(test)]
impl RandomSource for SequenceSource {
    fn next_byte(&mut self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }

        let byte = self.bytes[self.next];
        self.next = (self.next + 1) % self.bytes.len();
        byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_wraps_around() {
        let mut rng = SequenceSource::new(&[0x01, 0x02, 0x03]);

        assert_eq!(rng.next_byte(), 0x01);
        assert_eq!(rng.next_byte(), 0x02);
        assert_eq!(rng.next_byte(), 0x03);
        assert_eq!(rng.next_byte(), 0x01);
    }

    #[test]
    fn test_empty_sequence_yields_zero() {
        let mut rng = SequenceSource::new(&[]);

        assert_eq!(rng.next_byte(), 0x00);
        assert_eq!(rng.next_byte(), 0x00);
    }

    #[test]
    fn test_seeded_wyrand_is_reproducible() {
        let mut a = WyRandSource::with_seed(42);
        let mut b = WyRandSource::with_seed(42);

        for _ in 0..32 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }
}
