// src/rng.rs
//! Random Number Substrate for Monte Carlo Pricing
//!
//! # Design Philosophy
//!
//! Monte Carlo pricing requires random numbers with specific properties:
//! 1. **Reproducibility**: Same seed → same price (critical for debugging/validation)
//! 2. **Parallel safety**: Each worker thread must own a disjoint substream
//! 3. **Performance**: Fast generation for millions of paths
//! 4. **Statistical quality**: Good distributional properties
//!
//! # Generator
//!
//! The engine uses xoshiro256** — a 256-bit state advanced by an
//! XOR-shift-rotate update, with output taken as a mixed rotation of the
//! state words:
//! ```text
//! out  = rotl(s1 * 5, 7) * 9
//! t    = s1 << 17
//! s2 ^= s0;  s3 ^= s1;  s1 ^= s2;  s0 ^= s3;  s2 ^= t;  s3 = rotl(s3, 45)
//! ```
//!
//! The all-zero state is a fixed point of the update, so seeding guarantees
//! a non-zero state.
//!
//! # Substreams
//!
//! `jump()` advances the state by 2^128 steps via the documented jump
//! polynomial. Worker thread `i` owns the master state jumped `i` times,
//! giving streams that are disjoint over any realistic simulation length.
//!
//! # Box-Muller Transform
//!
//! Standard normals come from the trigonometric Box-Muller identity:
//! ```text
//! Z = √(-2 ln U₁) * cos(2π U₂)
//! ```
//! One normal is produced per call from a pair of uniforms; U₁ is mapped
//! from [0, 1) to (0, 1] before the logarithm so the singularity at zero is
//! unreachable.

use rand::{Error, RngCore, SeedableRng};

/// Jump polynomial for a 2^128-step advance of the xoshiro256 state.
const JUMP: [u64; 4] = [
    0x180ec6d33cfd0aba,
    0xd5a61266f0c9392c,
    0xa9582618e03fc9aa,
    0x39abdc4529b1661c,
];

/// Scale factor mapping the top 53 bits of a draw into [0, 1).
const UNIFORM_SCALE: f64 = 1.0 / 9007199254740992.0; // 2^53

/// splitmix64 avalanche step used for seed expansion.
///
/// Increments the state by a fixed odd constant, then XOR-shifts and
/// multiplies so that nearby seeds produce far-apart generator states.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e3779b97f4a7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Pseudo-random generator with deterministic jump-derived substreams
///
/// # Thread Safety
///
/// A generator is owned by exactly one worker; parallel simulations clone
/// the master state and `jump()` it into per-thread substreams, so no state
/// is shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xoshiro256 {
    s: [u64; 4],
}

impl Xoshiro256 {
    /// Seed the generator from a 64-bit integer.
    ///
    /// The seed expands through four splitmix64 calls. Any seed is accepted;
    /// in the (negligibly rare) event that expansion yields the all-zero
    /// state, the first word is set to 1.
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut sm = seed;
        let mut s = [0u64; 4];
        for word in s.iter_mut() {
            *word = splitmix64(&mut sm);
        }
        if s == [0, 0, 0, 0] {
            s[0] = 1;
        }
        Xoshiro256 { s }
    }

    /// Next raw 64-bit draw (xoshiro256** output function + state advance).
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let out = self.s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);
        out
    }

    /// Uniform draw in [0, 1) from the top 53 bits.
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIFORM_SCALE
    }

    /// One standard normal draw N(0, 1).
    ///
    /// Consumes a pair of uniforms per call. The first uniform is mapped to
    /// (0, 1] so `ln` never sees zero. The sine branch of the transform is
    /// not cached; draw counts stay predictable for antithetic pairing and
    /// substream reasoning.
    #[inline]
    pub fn next_normal(&mut self) -> f64 {
        let u1 = 1.0 - self.next_uniform();
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Advance the state by 2^128 steps.
    ///
    /// For any base state B, `jump(B)` is deterministic and the jumped
    /// stream is disjoint from B's first 2^128 outputs. Calling it `i`
    /// times on a copy of the master yields worker `i`'s substream.
    pub fn jump(&mut self) {
        let mut s = [0u64; 4];
        for &word in JUMP.iter() {
            for bit in 0..64 {
                if (word >> bit) & 1 == 1 {
                    s[0] ^= self.s[0];
                    s[1] ^= self.s[1];
                    s[2] ^= self.s[2];
                    s[3] ^= self.s[3];
                }
                self.next_u64();
            }
        }
        self.s = s;
    }

    /// Copy of this generator advanced by `n` jumps.
    pub fn jumped(&self, n: usize) -> Self {
        let mut rng = self.clone();
        for _ in 0..n {
            rng.jump();
        }
        rng
    }
}

impl RngCore for Xoshiro256 {
    fn next_u32(&mut self) -> u32 {
        (Xoshiro256::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        Xoshiro256::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&Xoshiro256::next_u64(self).to_le_bytes());
        }
        let rem = chunks.into_remainder();
        if !rem.is_empty() {
            let bytes = Xoshiro256::next_u64(self).to_le_bytes();
            let len = rem.len();
            rem.copy_from_slice(&bytes[..len]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Xoshiro256 {
    type Seed = [u8; 32];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut s = [0u64; 4];
        for (i, word) in s.iter_mut().enumerate() {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&seed[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(bytes);
        }
        if s == [0, 0, 0, 0] {
            s[0] = 1;
        }
        Xoshiro256 { s }
    }

    fn seed_from_u64(state: u64) -> Self {
        Xoshiro256::from_seed_u64(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut rng1 = Xoshiro256::from_seed_u64(42);
        let mut rng2 = Xoshiro256::from_seed_u64(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut rng1 = Xoshiro256::from_seed_u64(42);
        let mut rng2 = Xoshiro256::from_seed_u64(43);

        let vals1: Vec<u64> = (0..10).map(|_| rng1.next_u64()).collect();
        let vals2: Vec<u64> = (0..10).map(|_| rng2.next_u64()).collect();

        assert_ne!(vals1, vals2);
    }

    #[test]
    fn test_seed_zero_is_valid() {
        let mut rng = Xoshiro256::from_seed_u64(0);
        // Must not sit on the all-zero fixed point.
        let vals: Vec<u64> = (0..10).map(|_| rng.next_u64()).collect();
        assert!(vals.iter().any(|&v| v != vals[0]));
    }

    #[test]
    fn test_uniform_range_and_mean() {
        let mut rng = Xoshiro256::from_seed_u64(42);
        let n = 100_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let u = rng.next_uniform();
            assert!((0.0..1.0).contains(&u), "uniform out of [0,1): {}", u);
            sum += u;
        }
        let mean = sum / n as f64;
        assert!(
            (mean - 0.5).abs() < 0.01,
            "uniform mean should be 0.5 ± 0.01, got {}",
            mean
        );
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = Xoshiro256::from_seed_u64(42);
        let n = 100_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.next_normal()).collect();

        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples.iter().map(|z| (z - mean) * (z - mean)).sum::<f64>() / n as f64;

        assert!(mean.abs() < 0.02, "normal mean should be 0 ± 0.02, got {}", mean);
        assert!(
            (variance - 1.0).abs() < 0.02,
            "normal variance should be 1 ± 0.02, got {}",
            variance
        );
    }

    #[test]
    fn test_normal_is_finite() {
        let mut rng = Xoshiro256::from_seed_u64(7);
        for _ in 0..100_000 {
            assert!(rng.next_normal().is_finite());
        }
    }

    #[test]
    fn test_jump_disjointness() {
        let base = Xoshiro256::from_seed_u64(42);

        let mut plain = base.clone();
        let mut jumped = base.clone();
        jumped.jump();

        for i in 0..100 {
            assert_ne!(
                plain.next_u64(),
                jumped.next_u64(),
                "jumped stream collided with base at output {}",
                i
            );
        }
    }

    #[test]
    fn test_jump_is_deterministic() {
        let base = Xoshiro256::from_seed_u64(42);
        let mut a = base.clone();
        let mut b = base.clone();
        a.jump();
        b.jump();
        assert_eq!(a, b);

        assert_eq!(base.jumped(3), base.jumped(2).jumped(1));
    }

    #[test]
    fn test_rand_trait_interop() {
        use rand::Rng;

        let mut rng = Xoshiro256::seed_from_u64(42);
        let u: f64 = rng.gen();
        assert!((0.0..1.0).contains(&u));

        let mut native = Xoshiro256::from_seed_u64(42);
        let mut via_trait = Xoshiro256::seed_from_u64(42);
        assert_eq!(native.next_u64(), RngCore::next_u64(&mut via_trait));
    }
}
