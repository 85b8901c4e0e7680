//! Identifier, stamp and house-code generation.
//!
//! # Responsibility
//! - Mint opaque entity ids and capture command timestamps.
//! - Generate 6-character join codes that do not collide with existing ones.
//!
//! # Invariants
//! - Ids derived from a `Stamp` are a pure function of the stamp id and label.
//! - House codes only use `HOUSE_CODE_ALPHABET`; comparison is case-normalized.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Join-code symbols. `I`, `O`, `0` and `1` are left out on purpose.
pub const HOUSE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Join-code length.
pub const HOUSE_CODE_LEN: usize = 6;

/// Returns a fresh random id.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Identity and time captured when a command is constructed.
///
/// The reducer never reads the clock or an RNG; everything it needs to mint
/// ids and timestamps comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamp {
    /// Id of the primary entity the command creates (if any).
    pub id: Uuid,
    /// Unix epoch milliseconds.
    pub at_ms: i64,
}

impl Stamp {
    pub fn new(id: Uuid, at_ms: i64) -> Self {
        Self { id, at_ms }
    }

    /// Derives a secondary id (e.g. `"notification"`, `"task"`) from this stamp.
    ///
    /// Same stamp + same label always yields the same id.
    pub fn derive(&self, label: &str) -> Uuid {
        Uuid::new_v5(&self.id, label.as_bytes())
    }
}

/// Trims and upper-cases user-entered join codes.
pub fn normalize_house_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Returns whether `code` (already normalized) is a well-formed join code.
pub fn is_valid_house_code(code: &str) -> bool {
    code.len() == HOUSE_CODE_LEN && code.bytes().all(|b| HOUSE_CODE_ALPHABET.contains(&b))
}

/// Generates a join code absent from `existing` using the thread RNG.
pub fn new_house_code<I, S>(existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    new_house_code_with(&mut rand::thread_rng(), existing)
}

/// Rejection-samples a join code absent from `existing`.
pub fn new_house_code_with<R, I, S>(rng: &mut R, existing: I) -> String
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let taken: HashSet<String> = existing
        .into_iter()
        .map(|code| normalize_house_code(code.as_ref()))
        .collect();

    loop {
        let candidate: String = (0..HOUSE_CODE_LEN)
            .map(|_| HOUSE_CODE_ALPHABET[rng.gen_range(0..HOUSE_CODE_ALPHABET.len())] as char)
            .collect();
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

/// Source of command stamps and join codes for the store façade.
pub trait StampSource {
    fn next_stamp(&mut self) -> Stamp;
    fn house_code(&mut self, existing: &HashSet<String>) -> String;
}

/// Production source: random v4 ids, wall clock, thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemStampSource;

impl StampSource for SystemStampSource {
    fn next_stamp(&mut self) -> Stamp {
        Stamp::new(new_id(), now_epoch_ms())
    }

    fn house_code(&mut self, existing: &HashSet<String>) -> String {
        new_house_code(existing)
    }
}

/// Deterministic source for replay and tests.
///
/// Ids come from a seeded RNG and the clock advances by a fixed step per stamp.
#[derive(Debug, Clone)]
pub struct SeededStampSource {
    rng: StdRng,
    clock_ms: i64,
    step_ms: i64,
}

impl SeededStampSource {
    pub fn new(seed: u64, start_ms: i64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock_ms: start_ms,
            step_ms: 1_000,
        }
    }

    /// Moves the fake clock; the next stamp is taken at `at_ms`.
    pub fn set_clock_ms(&mut self, at_ms: i64) {
        self.clock_ms = at_ms;
    }

    pub fn clock_ms(&self) -> i64 {
        self.clock_ms
    }
}

impl StampSource for SeededStampSource {
    fn next_stamp(&mut self) -> Stamp {
        let bytes: [u8; 16] = self.rng.gen();
        let stamp = Stamp::new(uuid::Builder::from_random_bytes(bytes).into_uuid(), self.clock_ms);
        self.clock_ms += self.step_ms;
        stamp
    }

    fn house_code(&mut self, existing: &HashSet<String>) -> String {
        new_house_code_with(&mut self.rng, existing)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_valid_house_code, new_house_code_with, normalize_house_code, SeededStampSource, Stamp,
        StampSource, HOUSE_CODE_ALPHABET,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    #[test]
    fn alphabet_excludes_confusable_glyphs() {
        for glyph in [b'I', b'O', b'0', b'1'] {
            assert!(!HOUSE_CODE_ALPHABET.contains(&glyph));
        }
        assert_eq!(HOUSE_CODE_ALPHABET.len(), 32);
    }

    #[test]
    fn derive_is_stable_and_label_sensitive() {
        let stamp = Stamp::new(Uuid::new_v4(), 42);
        assert_eq!(stamp.derive("task"), stamp.derive("task"));
        assert_ne!(stamp.derive("task"), stamp.derive("notification"));
        assert_ne!(stamp.derive("task"), stamp.id);
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_house_code("  ab2cd3 "), "AB2CD3");
        assert!(is_valid_house_code("AB2CD3"));
        assert!(!is_valid_house_code("AB2CD"));
        assert!(!is_valid_house_code("AB2CD0"));
    }

    #[test]
    fn generated_code_avoids_lowercase_duplicates() {
        let mut probe = StdRng::seed_from_u64(11);
        let first = new_house_code_with(&mut probe, Vec::<String>::new());

        let mut rng = StdRng::seed_from_u64(11);
        let second = new_house_code_with(&mut rng, [first.to_lowercase()]);
        assert_ne!(first, second);
        assert!(is_valid_house_code(&second));
    }

    #[test]
    fn seeded_source_is_reproducible() {
        let mut a = SeededStampSource::new(7, 1_000);
        let mut b = SeededStampSource::new(7, 1_000);
        let first = a.next_stamp();
        assert_eq!(first, b.next_stamp());
        assert_eq!(first.at_ms, 1_000);
        assert_eq!(a.next_stamp().at_ms, 2_000);
    }
}
