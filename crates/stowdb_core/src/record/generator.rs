//! Sources of fresh identifiers.

use super::RecordId;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use uuid::Builder;

/// Produces record IDs and generated `uuid` field values.
pub trait IdGenerator: Send {
    /// Returns a fresh record ID.
    fn next_id(&mut self) -> RecordId;

    /// Returns a fresh token for a generated `uuid` field.
    fn next_token(&mut self) -> String {
        self.next_id().to_string()
    }
}

/// Random v4 UUIDs from the operating system's generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> RecordId {
        RecordId::new()
    }
}

/// Deterministic v4 UUIDs from a seeded RNG.
///
/// Two generators built from the same seed yield the same sequence, which
/// keeps test output stable.
#[derive(Debug, Clone)]
pub struct SeededIdGenerator {
    rng: StdRng,
}

impl SeededIdGenerator {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl IdGenerator for SeededIdGenerator {
    fn next_id(&mut self) -> RecordId {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        RecordId::from_uuid(Builder::from_random_bytes(bytes).into_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sequences_repeat() {
        let mut a = SeededIdGenerator::new(42);
        let mut b = SeededIdGenerator::new(42);
        for _ in 0..5 {
            assert_eq!(a.next_id(), b.next_id());
        }
    }

    #[test]
    fn seeded_ids_are_v4() {
        let mut ids = SeededIdGenerator::new(1);
        let id = ids.next_id();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn tokens_are_uuid_text() {
        let mut ids = RandomIdGenerator;
        let token = ids.next_token();
        assert_eq!(token.len(), 36);
        assert!(RecordId::parse(&token).is_some());
    }
}
