use rand::SeedableRng;
use rand::rngs::StdRng;

/// Deterministic seed for tests and examples.
pub const FIXED_TEST_SEED: u64 = 0x5EED_2024;

/// Returns a generator seeded from the operating system.
#[must_use]
pub fn entropy_rng() -> StdRng {
    StdRng::from_os_rng()
}

/// Returns a reproducible generator for the given seed.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Returns a generator seeded with [`FIXED_TEST_SEED`].
#[must_use]
pub fn fixed_rng() -> StdRng {
    seeded_rng(FIXED_TEST_SEED)
}
