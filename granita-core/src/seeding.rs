//! Deterministic seed derivation for independent Monte Carlo units.
//!
//! Each realization and each generation run gets its own `SmallRng` seeded
//! from the configured base seed mixed with the unit's index. Mixing with
//! SplitMix64 keeps the streams decorrelated while making results identical
//! no matter how units are scheduled across worker threads.

/// SplitMix64 increment (the 64-bit golden ratio).
const SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

/// Derives the seed for the unit at `index` from `base_seed`.
#[inline]
#[must_use]
pub(crate) fn mix_seed(base_seed: u64, index: usize) -> u64 {
    splitmix64(base_seed ^ ((index as u64 + 1).wrapping_mul(SEED_SPACING)))
}

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_seeds_differ_between_units() {
        let seeds: Vec<u64> = (0..64).map(|index| mix_seed(42, index)).collect();
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
    }

    #[test]
    fn mixing_is_stable_for_a_fixed_base() {
        assert_eq!(mix_seed(7, 3), mix_seed(7, 3));
        assert_ne!(mix_seed(7, 3), mix_seed(8, 3));
    }
}
