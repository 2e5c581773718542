//! Shared sampling primitives: weighted categorical tables, count ranges and
//! reproducible identifiers.

use rand::Rng;
use rand_distr::{Distribution, Triangular};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::GenerationError;

/// Draws a UUID from the run's random stream so identifiers are reproducible.
pub fn next_id(rng: &mut impl Rng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid()
}

/// Picks an index by cumulative weight.
///
/// A uniform value in `[0, total)` is drawn and the first entry whose running
/// total exceeds it wins. Returns `None` when no entry has positive weight.
pub fn weighted_index(weights: &[f64], rng: &mut impl Rng) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }

    let roll = rng.r#gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;

    for (i, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(i);
        if roll < cumulative {
            return Some(i);
        }
    }

    // Floating-point rounding can leave `roll` a hair above the final total.
    last_positive
}

/// Draws up to `count` distinct indices, zeroing each winner's weight before
/// the next draw.
pub fn weighted_sample_unique(
    mut weights: Vec<f64>,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut picked = Vec::with_capacity(count.min(weights.len()));
    while picked.len() < count {
        let Some(idx) = weighted_index(&weights, rng) else {
            break;
        };
        weights[idx] = 0.0;
        picked.push(idx);
    }
    picked
}

/// Weighted coin flip.
pub fn chance(p: f64, rng: &mut impl Rng) -> bool {
    rng.r#gen::<f64>() < p
}

/// Exactly `round(len * fraction)` distinct indices out of `len`, in ascending order.
pub fn sample_fraction(len: usize, fraction: f64, rng: &mut impl Rng) -> Vec<usize> {
    let amount = ((len as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
    let mut picked = rand::seq::index::sample(rng, len, amount.min(len)).into_vec();
    picked.sort_unstable();
    picked
}

/// Triangular draw over `[min, max]`; degenerate ranges return `min`.
pub fn triangular(min: f64, max: f64, mode: f64, rng: &mut impl Rng) -> f64 {
    if max <= min {
        return min;
    }
    match Triangular::new(min, max, mode.clamp(min, max)) {
        Ok(dist) => dist.sample(rng),
        Err(_) => min,
    }
}

/// A category together with its relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub value: T,
    pub weight: f64,
}

/// Discrete distribution over categories with relative weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedTable<T> {
    entries: Vec<Weighted<T>>,
}

impl<T> WeightedTable<T> {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, f64)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(value, weight)| Weighted { value, weight })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[Weighted<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Rejects empty tables, negative or non-finite weights and zero totals.
    pub fn validate(&self, parameter: &str) -> Result<(), GenerationError> {
        if self.entries.is_empty() {
            return Err(GenerationError::config(parameter, "distribution is empty"));
        }
        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| !e.weight.is_finite() || e.weight < 0.0)
        {
            return Err(GenerationError::config(
                parameter,
                format!("weight {} is not a finite non-negative number", bad.weight),
            ));
        }
        if self.total_weight() <= 0.0 {
            return Err(GenerationError::config(parameter, "weights sum to zero"));
        }
        Ok(())
    }

    pub fn sample_index(&self, rng: &mut impl Rng) -> Option<usize> {
        let weights: Vec<f64> = self.entries.iter().map(|e| e.weight).collect();
        weighted_index(&weights, rng)
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Option<&T> {
        self.sample_index(rng).map(|i| &self.entries[i].value)
    }

    /// Like [`sample`](Self::sample), reporting an empty table as a configuration error.
    pub fn draw(&self, parameter: &str, rng: &mut impl Rng) -> Result<&T, GenerationError> {
        self.sample(rng)
            .ok_or_else(|| GenerationError::config(parameter, "no category with positive weight"))
    }
}

/// Inclusive count range for entity volumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
    /// Offset of the triangular mode above the midpoint.
    #[serde(default)]
    pub mode_bias: f64,
}

impl CountRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            mode_bias: 0.0,
        }
    }

    pub const fn exactly(n: usize) -> Self {
        Self::new(n, n)
    }

    pub const fn with_mode_bias(mut self, bias: f64) -> Self {
        self.mode_bias = bias;
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }

    pub fn validate(&self, parameter: &str, floor: usize) -> Result<(), GenerationError> {
        if self.min > self.max {
            return Err(GenerationError::config(
                parameter,
                format!("min {} exceeds max {}", self.min, self.max),
            ));
        }
        if self.min < floor {
            return Err(GenerationError::config(
                parameter,
                format!("min {} is below {floor}", self.min),
            ));
        }
        if !self.mode_bias.is_finite() {
            return Err(GenerationError::config(parameter, "mode_bias must be finite"));
        }
        Ok(())
    }

    /// Triangular draw with the mode nudged above the midpoint.
    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        if self.is_fixed() {
            return self.min;
        }
        let (min, max) = (self.min as f64, self.max as f64);
        let mode = (min + max) / 2.0 + self.mode_bias;
        let n = triangular(min, max, mode, rng).round() as usize;
        n.clamp(self.min, self.max)
    }

    pub fn sample_uniform(&self, rng: &mut impl Rng) -> usize {
        if self.is_fixed() {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Inclusive probability range; one value is drawn per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionRange {
    pub min: f64,
    pub max: f64,
}

impl FractionRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, parameter: &str) -> Result<(), GenerationError> {
        check_probability(parameter, self.min)?;
        check_probability(parameter, self.max)?;
        if self.min > self.max {
            return Err(GenerationError::config(
                parameter,
                format!("min {} exceeds max {}", self.min, self.max),
            ));
        }
        Ok(())
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

pub fn check_probability(parameter: &str, p: f64) -> Result<(), GenerationError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(GenerationError::config(
            parameter,
            format!("{p} is not a probability in [0, 1]"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_weighted_index_respects_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = [0.7, 0.2, 0.1];
        let mut hits = [0usize; 3];

        for _ in 0..10_000 {
            hits[weighted_index(&weights, &mut rng).unwrap()] += 1;
        }

        assert!(hits[0] > 6_500 && hits[0] < 7_500, "hits: {hits:?}");
        assert!(hits[2] > 700 && hits[2] < 1_300, "hits: {hits:?}");
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert_eq!(weighted_index(&[0.0, 3.0, 0.0], &mut rng), Some(1));
        }
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), None);
        assert_eq!(weighted_index(&[], &mut rng), None);
    }

    #[test]
    fn test_unique_sample_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(3);
        let picked = weighted_sample_unique(vec![5.0, 1.0, 1.0, 0.0, 2.0], 10, &mut rng);

        // Only four entries carry weight.
        assert_eq!(picked.len(), 4);
        let unique: std::collections::BTreeSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(!picked.contains(&3));
    }

    #[test]
    fn test_sample_fraction_is_exact() {
        let mut rng = StdRng::seed_from_u64(17);
        let picked = sample_fraction(4_000, 0.2, &mut rng);

        assert_eq!(picked.len(), 800);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|i| *i < 4_000));
        assert!(sample_fraction(0, 0.5, &mut rng).is_empty());
    }

    #[test]
    fn test_table_validation() {
        let ok = WeightedTable::from_pairs([("a", 1.0), ("b", 0.0)]);
        assert!(ok.validate("ok").is_ok());

        let zero = WeightedTable::from_pairs([("a", 0.0), ("b", 0.0)]);
        assert!(matches!(
            zero.validate("zero"),
            Err(GenerationError::Configuration { .. })
        ));

        let negative = WeightedTable::from_pairs([("a", -1.0), ("b", 2.0)]);
        assert!(negative.validate("negative").is_err());

        let empty: WeightedTable<&str> = WeightedTable::from_pairs([]);
        assert!(empty.validate("empty").is_err());
    }

    #[test]
    fn test_table_serde_shape() {
        let table = WeightedTable::from_pairs([("low".to_string(), 0.3)]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"value":"low","weight":0.3}]"#);

        let back: WeightedTable<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_count_range_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let range = CountRange::new(40, 120).with_mode_bias(10.0);

        for _ in 0..2_000 {
            assert!(range.contains(range.sample(&mut rng)));
            assert!(range.contains(range.sample_uniform(&mut rng)));
        }
        assert_eq!(CountRange::exactly(80).sample(&mut rng), 80);
    }

    #[test]
    fn test_count_range_validation() {
        assert!(CountRange::new(5, 3).validate("x", 0).is_err());
        assert!(CountRange::new(0, 3).validate("x", 1).is_err());
        assert!(CountRange::new(1, 3).validate("x", 1).is_ok());
    }

    #[test]
    fn test_ids_are_reproducible() {
        let a: Vec<Uuid> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..5).map(|_| next_id(&mut rng)).collect()
        };
        let b: Vec<Uuid> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..5).map(|_| next_id(&mut rng)).collect()
        };
        assert_eq!(a, b);
        assert_eq!(a[0].get_version_num(), 4);
    }
}
