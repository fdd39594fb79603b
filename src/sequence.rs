//! # Step sequences and the cycle-lemma rebalancing transform
//!
//! A [`Sequence`] starts life in the canonical layout of `n` up-steps followed by
//! `n + 1` down-steps. The sampler then moves it through a one-way lifecycle:
//!
//! 1. **Constructed**: [`Sequence::new`] builds the canonical layout.
//! 2. **Scrambled**: [`Sequence::scramble`] applies a Fisher-Yates shuffle in place.
//! 3. **Balanced**: [`Sequence::cut_and_splice`] consumes the scrambled sequence and
//!    returns its unique balanced rotation, one symbol shorter.
//!
//! Sequences are value types. Equality compares the steps element-wise and the
//! [`Hash`] implementation goes through [`SequenceKey`], a packed encoding that is
//! injective over sequences, so the two always agree.

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;
use rand_distr::{Binomial, Distribution};

use crate::prefix::non_neg_prefix_sum;

/// Largest `n` accepted by [`Sequence::new`].
///
/// Sampling is already impractical long before this; the bound only keeps
/// `2n + 1` comfortably addressable.
pub const MAX_HALF_LENGTH: usize = 1 << 28;

/// Number of steps that still fit in a single packed `u64` key.
const PACKED_KEY_BITS: usize = u64::BITS as usize;

/// Errors raised while building a sequence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("n = {n} exceeds the supported maximum of {max}")]
    TooLarge { n: usize, max: usize },

    #[error("invalid symbol {value} at index {index}: expected 1 or -1")]
    InvalidSymbol { value: i8, index: usize },
}

/// A single unit step of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Step {
    Up = 1,
    Down = -1,
}

impl Step {
    pub fn value(self) -> i8 {
        self as i8
    }

    pub fn from_value(value: i8) -> Option<Step> {
        match value {
            1 => Some(Step::Up),
            -1 => Some(Step::Down),
            _ => None,
        }
    }
}

impl From<Step> for i8 {
    fn from(step: Step) -> i8 {
        step.value()
    }
}

impl From<Step> for i64 {
    fn from(step: Step) -> i64 {
        i64::from(step.value())
    }
}

/// How [`Sequence::scramble`] draws the swap partner at each Fisher-Yates step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrambleMode {
    /// Uniform draw over `0..=i`; yields a uniformly random permutation.
    #[default]
    Uniform,
    /// Binomial(i, 0.5) draw over the same range. Deliberately skewed, used
    /// to check that the convergence loop rejects a bad sampler.
    Biased,
}

/// Hashable encoding of a sequence.
///
/// Sequences of up to 64 steps pack into a single word (with the length kept
/// alongside so that `{1}` and `{1, -1}` differ); longer ones fall back to one
/// byte per step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SequenceKey {
    Packed { len: u8, bits: u64 },
    Bytes(Vec<u8>),
}

/// An ordered list of up and down steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    /// Canonical layout for `n`: `n` up-steps followed by `n + 1` down-steps.
    pub fn new(n: usize) -> Result<Self, SequenceError> {
        if n > MAX_HALF_LENGTH {
            return Err(SequenceError::TooLarge { n, max: MAX_HALF_LENGTH });
        }
        let mut steps = Vec::with_capacity(2 * n + 1);
        steps.resize(n, Step::Up);
        steps.resize(2 * n + 1, Step::Down);
        Ok(Self { steps })
    }

    /// Build a sequence from raw `1` / `-1` values.
    pub fn from_values(values: &[i8]) -> Result<Self, SequenceError> {
        let steps = values
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                Step::from_value(value).ok_or(SequenceError::InvalidSymbol { value, index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    /// `count` copies of the canonical sequence for `n`.
    pub fn generate(n: usize, count: usize) -> Result<Vec<Self>, SequenceError> {
        let canonical = Self::new(n)?;
        Ok(vec![canonical; count])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn values(&self) -> Vec<i8> {
        self.steps.iter().map(|&step| step.value()).collect()
    }

    /// True when every prefix sum is non-negative.
    ///
    /// Only the non-negative convention counts as balanced; an all-non-positive
    /// sequence is not.
    pub fn is_balanced(&self) -> bool {
        non_neg_prefix_sum(self.steps.iter().copied())
    }

    /// In-place Fisher-Yates shuffle.
    ///
    /// Walks `i` from the last index down to 1, draws `j` in `0..=i` and swaps
    /// positions `i` and `j`.
    pub fn scramble<R: Rng + ?Sized>(&mut self, rng: &mut R, mode: ScrambleMode) {
        for i in (1..self.steps.len()).rev() {
            let j = match mode {
                ScrambleMode::Uniform => rng.gen_range(0..=i),
                ScrambleMode::Biased => Binomial::new(i as u64, 0.5)
                    .expect("p = 0.5 is a valid binomial probability")
                    .sample(rng) as usize,
            };
            self.steps.swap(i, j);
        }
    }

    /// Running totals of the steps, one per position.
    pub fn partial_sums(&self) -> impl Iterator<Item = i64> + '_ {
        self.steps.iter().scan(0i64, |sum, &step| {
            *sum += i64::from(step);
            Some(*sum)
        })
    }

    /// Index of the global minimum of the partial sums.
    ///
    /// Ties resolve to the first minimum; `None` for an empty sequence.
    pub fn lowest_valley(&self) -> Option<usize> {
        self.partial_sums()
            .enumerate()
            .min_by_key(|&(_, sum)| sum)
            .map(|(index, _)| index)
    }

    /// Rotate to start just after the lowest valley and drop the valley step.
    ///
    /// The result is `steps[i + 1..]` followed by `steps[..i]`, where `i` is
    /// [`lowest_valley`](Self::lowest_valley). The step at `i` is the down-step
    /// that completes the minimum and is discarded, so a `2n + 1` sequence with
    /// `n + 1` down-steps comes out as a balanced sequence of length `2n`.
    pub fn cut_and_splice(self) -> Sequence {
        let Some(valley) = self.lowest_valley() else {
            return self;
        };
        let mut steps = Vec::with_capacity(self.steps.len() - 1);
        steps.extend_from_slice(&self.steps[valley + 1..]);
        steps.extend_from_slice(&self.steps[..valley]);
        Sequence { steps }
    }

    /// Highest and lowest partial sums, clamped so the pair always spans zero.
    pub fn hilo_extent(&self) -> (i64, i64) {
        self.partial_sums()
            .fold((0, 0), |(high, low), sum| (high.max(sum), low.min(sum)))
    }

    pub fn key(&self) -> SequenceKey {
        if self.steps.len() <= PACKED_KEY_BITS {
            let bits = self
                .steps
                .iter()
                .fold(0u64, |bits, &step| (bits << 1) | u64::from(step == Step::Up));
            SequenceKey::Packed {
                len: self.steps.len() as u8,
                bits,
            }
        } else {
            SequenceKey::Bytes(
                self.steps
                    .iter()
                    .map(|&step| if step == Step::Up { b'1' } else { b'0' })
                    .collect(),
            )
        }
    }
}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", step.value())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(sequence: &Sequence) -> u64 {
        let mut hasher = DefaultHasher::new();
        sequence.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_canonical_layout() {
        let sequence = Sequence::new(3).unwrap();
        assert_eq!(sequence.values(), vec![1, 1, 1, -1, -1, -1, -1]);
        assert_eq!(Sequence::new(0).unwrap().values(), vec![-1]);
    }

    #[test]
    fn test_new_rejects_oversized_n() {
        let err = Sequence::new(MAX_HALF_LENGTH + 1).unwrap_err();
        assert_eq!(
            err,
            SequenceError::TooLarge {
                n: MAX_HALF_LENGTH + 1,
                max: MAX_HALF_LENGTH
            }
        );
    }

    #[test]
    fn test_from_values_rejects_bad_symbol() {
        let err = Sequence::from_values(&[1, 0, -1]).unwrap_err();
        assert_eq!(err, SequenceError::InvalidSymbol { value: 0, index: 1 });
    }

    #[test]
    fn test_scramble_preserves_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for mode in [ScrambleMode::Uniform, ScrambleMode::Biased] {
            let mut sequence = Sequence::new(6).unwrap();
            sequence.scramble(&mut rng, mode);
            let ups = sequence.steps().iter().filter(|&&s| s == Step::Up).count();
            assert_eq!(sequence.len(), 13);
            assert_eq!(ups, 6);
        }
    }

    #[test]
    fn test_scramble_with_zero_draws() {
        // every draw is 0, so each step swaps position i with the front
        let mut rng = StepRng::new(0, 0);
        let mut sequence = Sequence::new(3).unwrap();
        sequence.scramble(&mut rng, ScrambleMode::Uniform);
        assert_eq!(sequence.values(), vec![1, 1, -1, -1, -1, -1, 1]);
    }

    #[test]
    fn test_biased_scramble_draws_binomially() {
        // For three steps the up-step only lands last when the first draw,
        // Binomial(2, 0.5), is 0: probability 1/4 instead of the uniform 1/3.
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let trials = 20_000;
        let mut last_is_up = 0;
        for _ in 0..trials {
            let mut sequence = Sequence::from_values(&[1, -1, -1]).unwrap();
            sequence.scramble(&mut rng, ScrambleMode::Biased);
            if sequence.steps()[2] == Step::Up {
                last_is_up += 1;
            }
        }
        let share = last_is_up as f64 / trials as f64;
        assert!((share - 0.25).abs() < 0.02, "share was {}", share);
    }

    #[test]
    fn test_lowest_valley_takes_first_minimum() {
        let sequence = Sequence::from_values(&[-1, 1, -1, 1, -1]).unwrap();
        // partial sums: -1, 0, -1, 0, -1
        assert_eq!(sequence.lowest_valley(), Some(0));

        let sequence = Sequence::from_values(&[1, -1, -1, -1, 1]).unwrap();
        assert_eq!(sequence.lowest_valley(), Some(3));

        assert_eq!(Sequence::from_values(&[]).unwrap().lowest_valley(), None);
    }

    #[test]
    fn test_cut_and_splice_drops_valley_step() {
        let sequence = Sequence::from_values(&[1, -1, -1, 1, -1]).unwrap();
        // partial sums: 1, 0, -1, 0, -1 -> valley at index 2
        let balanced = sequence.cut_and_splice();
        assert_eq!(balanced.values(), vec![1, -1, 1, -1]);
        assert!(balanced.is_balanced());
    }

    #[test]
    fn test_cut_and_splice_on_canonical() {
        let balanced = Sequence::new(2).unwrap().cut_and_splice();
        assert_eq!(balanced.values(), vec![1, 1, -1, -1]);
    }

    #[test]
    fn test_cut_and_splice_valley_at_end() {
        let balanced = Sequence::from_values(&[1, -1, -1]).unwrap().cut_and_splice();
        assert_eq!(balanced.values(), vec![1, -1]);
    }

    #[test]
    fn test_is_balanced_ignores_non_positive_convention() {
        let sequence = Sequence::from_values(&[-1, 1, -1, 1]).unwrap();
        assert!(!sequence.is_balanced());
        assert!(Sequence::from_values(&[]).unwrap().is_balanced());
    }

    #[test]
    fn test_hilo_extent_is_clamped() {
        let up_only = Sequence::from_values(&[1, 1, -1]).unwrap();
        assert_eq!(up_only.hilo_extent(), (2, 0));

        let down_only = Sequence::from_values(&[-1, -1, 1]).unwrap();
        assert_eq!(down_only.hilo_extent(), (0, -2));

        let mixed = Sequence::from_values(&[1, -1, -1, -1, 1, 1, 1]).unwrap();
        assert_eq!(mixed.hilo_extent(), (1, -2));
    }

    #[test]
    fn test_key_is_length_aware() {
        let short = Sequence::from_values(&[-1]).unwrap();
        let longer = Sequence::from_values(&[-1, -1]).unwrap();
        assert_ne!(short.key(), longer.key());
        assert_eq!(
            Sequence::from_values(&[1, -1, 1]).unwrap().key(),
            SequenceKey::Packed { len: 3, bits: 0b101 }
        );
    }

    #[test]
    fn test_long_sequences_use_byte_keys() {
        let sequence = Sequence::new(40).unwrap();
        match sequence.key() {
            SequenceKey::Bytes(bytes) => {
                assert_eq!(bytes.len(), 81);
                assert_eq!(bytes[0], b'1');
                assert_eq!(bytes[80], b'0');
            }
            other => panic!("expected byte key, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_sequences_hash_equal() {
        let a = Sequence::from_values(&[1, 1, -1, -1]).unwrap();
        let b = Sequence::new(2).unwrap().cut_and_splice();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let long_a = Sequence::new(40).unwrap();
        let long_b = Sequence::new(40).unwrap();
        assert_eq!(hash_of(&long_a), hash_of(&long_b));
    }

    #[test]
    fn test_display() {
        assert_eq!(Sequence::from_values(&[]).unwrap().to_string(), "{}");
        assert_eq!(Sequence::new(1).unwrap().to_string(), "{1, -1, -1}");
    }

    #[test]
    fn test_generate_batch() {
        let batch = Sequence::generate(2, 5).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(batch.iter().all(|s| s.values() == vec![1, 1, -1, -1, -1]));
    }
}
