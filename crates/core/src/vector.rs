//! Sparse `fingerprint -> weight` vectors used by the similarity scoring
//! strategies.

use std::collections::HashMap;

use crate::model::TermCountVector;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector(HashMap<u64, f64>);

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Term counts weighted per key; keys absent from `weights` contribute
    /// nothing.
    pub fn weighted(counts: &TermCountVector, weights: &HashMap<u64, f64>) -> Self {
        let entries = counts
            .iter()
            .filter_map(|(&key, &count)| {
                let weight = weights.get(&key)?;
                Some((key, f64::from(count) * weight))
            })
            .collect();

        Self(entries)
    }

    pub fn insert(&mut self, key: u64, value: f64) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: u64) -> Option<f64> {
        self.0.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        // Walk the smaller side.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };

        small
            .0
            .iter()
            .filter_map(|(key, value)| Some(value * large.get(*key)?))
            .sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.0.values().map(|value| value * value).sum::<f64>().sqrt()
    }

    /// Zero when either side has zero magnitude.
    pub fn cosine_similarity(&self, other: &SparseVector) -> f64 {
        let denominator = self.l2_norm() * other.l2_norm();

        if denominator == 0.0 {
            return 0.0;
        }

        self.dot(other) / denominator
    }
}

impl FromIterator<(u64, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (u64, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(u64, f64)]) -> SparseVector {
        entries.iter().copied().collect()
    }

    #[test]
    fn dot_only_counts_shared_keys() {
        let a = vector(&[(1, 2.0), (2, 3.0), (3, 5.0)]);
        let b = vector(&[(2, 4.0), (3, 1.0), (9, 100.0)]);

        assert_eq!(a.dot(&b), 17.0);
        assert_eq!(b.dot(&a), 17.0);
    }

    #[test]
    fn l2_norm_of_three_four() {
        let v = vector(&[(1, 3.0), (2, 4.0)]);

        assert_eq!(v.l2_norm(), 5.0);
    }

    #[test]
    fn cosine_of_self_is_one() {
        let v = vector(&[(1, 1.5), (7, 2.5), (9, 0.5)]);

        assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_of_disjoint_vectors_is_zero() {
        let a = vector(&[(1, 1.0)]);
        let b = vector(&[(2, 1.0)]);

        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn cosine_with_empty_vector_is_zero() {
        let a = vector(&[(1, 1.0)]);

        assert_eq!(a.cosine_similarity(&SparseVector::new()), 0.0);
    }

    #[test]
    fn weighted_drops_unweighted_keys() {
        let counts = TermCountVector::from([(1, 2), (2, 3)]);
        let weights = HashMap::from([(1, 0.5)]);

        let v = SparseVector::weighted(&counts, &weights);

        assert_eq!(v.get(1), Some(1.0));
        assert_eq!(v.get(2), None);
        assert_eq!(v.len(), 1);
    }
}
