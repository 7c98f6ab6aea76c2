use rand::rand_core::impls;
use rand::RngCore;
use uuid::Uuid;

/// Length of a generated seed token.
const SEED_TOKEN_LEN: usize = 8;

/// 32-bit FNV-1a hash of a seed string.
///
/// Small and stable on purpose: the hash is part of the replay contract, so
/// a recorded seed must map to the same permutation forever.
#[must_use]
pub fn fnv1a_32(input: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in input.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// mulberry32, a tiny deterministic 32-bit PRNG.
///
/// Implements `RngCore` so the session shuffle can go through the usual
/// `rand` adaptors while staying reproducible from a seed string.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed from a string via FNV-1a.
    #[must_use]
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(fnv1a_32(seed))
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut r = self.state;
        r = (r ^ (r >> 15)).wrapping_mul(r | 1);
        r ^= r.wrapping_add((r ^ (r >> 7)).wrapping_mul(r | 61));
        r ^ (r >> 14)
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }
}

/// Resolve the seed for a run: a supplied non-blank seed wins, otherwise a
/// fresh random token is generated so the run stays replayable afterwards.
#[must_use]
pub fn resolve_seed(requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(seed) => seed.to_string(),
        None => Uuid::new_v4().simple().to_string()[..SEED_TOKEN_LEN].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_matches_reference_values() {
        // Offset basis for the empty string, and a couple of spot checks
        // against the published FNV-1a test vectors.
        assert_eq!(fnv1a_32(""), 0x811c_9dc5);
        assert_eq!(fnv1a_32("a"), 0xe40c_292c);
        assert_eq!(fnv1a_32("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn same_seed_produces_same_stream() {
        let mut a = Mulberry32::from_seed_str("replay");
        let mut b = Mulberry32::from_seed_str("replay");
        for _ in 0..32 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Mulberry32::from_seed_str("alpha");
        let mut b = Mulberry32::from_seed_str("beta");
        let a_run: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let b_run: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(a_run, b_run);
    }

    #[test]
    fn supplied_seed_is_trimmed_and_kept() {
        assert_eq!(resolve_seed(Some("  replay-1  ")), "replay-1");
    }

    #[test]
    fn blank_seed_generates_a_token() {
        let token = resolve_seed(Some("   "));
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Generated tokens are random; two draws should differ.
        assert_ne!(resolve_seed(None), resolve_seed(None));
    }
}
