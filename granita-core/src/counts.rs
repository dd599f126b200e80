//! Graphlet count vectors, signed deltas, and per-class frequency bounds.
//!
//! A [`CountVector`] is always tied to the catalog it was created from: its
//! slots line up with [`crate::GraphletCatalog::classes`] by index. The
//! generator keeps one live vector in sync with the graph under construction
//! by applying [`CountDelta`]s from the incremental counter.

use thiserror::Error;

use crate::catalog::{ClassId, GraphletCatalog};

/// An error produced while assembling frequency bounds.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BoundsError {
    /// A class interval had `lower > upper`.
    #[error("class {class} has inverted bounds [{lower}, {upper}]")]
    InvertedInterval {
        /// Index of the offending class.
        class: usize,
        /// The lower bound supplied.
        lower: u64,
        /// The upper bound supplied.
        upper: u64,
    },
}

/// Per-class counts of induced graphlet occurrences in one graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountVector {
    counts: Vec<u64>,
}

impl CountVector {
    /// Creates an all-zero vector shaped for `catalog`.
    #[must_use]
    pub fn zeros(catalog: &GraphletCatalog) -> Self {
        Self {
            counts: vec![0; catalog.len()],
        }
    }

    /// Returns the number of classes tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns whether the vector tracks no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns the count for one class, or zero for foreign ids.
    #[must_use]
    pub fn get(&self, id: ClassId) -> u64 {
        self.counts.get(id.index()).copied().unwrap_or(0)
    }

    /// Returns the raw per-class counts, catalog order.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Increments one class by one occurrence.
    pub(crate) fn record(&mut self, id: ClassId) {
        self.counts[id.index()] += 1;
    }

    /// Applies a signed delta, returning the resulting vector.
    ///
    /// Returns `None` when the delta would drive any class negative, which
    /// indicates the delta was computed against a different graph state.
    #[must_use]
    pub fn applying(&self, delta: &CountDelta) -> Option<Self> {
        if delta.len() != self.len() {
            return None;
        }
        let mut counts = Vec::with_capacity(self.counts.len());
        for (&count, &change) in self.counts.iter().zip(delta.as_slice()) {
            counts.push(count.checked_add_signed(change)?);
        }
        Some(Self { counts })
    }
}

/// Signed per-class change produced by toggling one edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountDelta {
    deltas: Vec<i64>,
}

impl CountDelta {
    /// Creates an all-zero delta shaped for `catalog`.
    #[must_use]
    pub fn zeros(catalog: &GraphletCatalog) -> Self {
        Self {
            deltas: vec![0; catalog.len()],
        }
    }

    /// Returns the number of classes tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Returns the raw signed changes, catalog order.
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.deltas
    }

    /// Adjusts one class by `change`.
    pub(crate) fn shift(&mut self, id: ClassId, change: i64) {
        self.deltas[id.index()] += change;
    }
}

/// Closed `[lower, upper]` interval for one graphlet class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassBounds {
    lower: u64,
    upper: u64,
}

impl ClassBounds {
    /// Creates an interval; `lower` must not exceed `upper`.
    #[must_use]
    pub(crate) const fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn lower(&self) -> u64 {
        self.lower
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn upper(&self) -> u64 {
        self.upper
    }

    /// Returns whether `count` lies within the closed interval.
    #[must_use]
    pub const fn contains(&self, count: u64) -> bool {
        self.lower <= count && count <= self.upper
    }
}

/// Read-only per-class frequency bounds derived from sampling.
///
/// # Examples
/// ```
/// use granita_core::{FrequencyBounds, GraphletCatalog, GraphletOrder};
///
/// let catalog = GraphletCatalog::new(GraphletOrder::Three);
/// let bounds = FrequencyBounds::from_limits(vec![(1, 4), (0, 1)])
///     .expect("intervals are well formed");
/// assert_eq!(bounds.len(), catalog.len());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyBounds {
    bounds: Vec<ClassBounds>,
}

impl FrequencyBounds {
    /// Builds bounds from explicit `(lower, upper)` pairs in catalog order.
    ///
    /// # Errors
    /// Returns [`BoundsError::InvertedInterval`] when any pair has
    /// `lower > upper`.
    pub fn from_limits(limits: Vec<(u64, u64)>) -> Result<Self, BoundsError> {
        let mut bounds = Vec::with_capacity(limits.len());
        for (class, (lower, upper)) in limits.into_iter().enumerate() {
            if lower > upper {
                return Err(BoundsError::InvertedInterval {
                    class,
                    lower,
                    upper,
                });
            }
            bounds.push(ClassBounds::new(lower, upper));
        }
        Ok(Self { bounds })
    }

    pub(crate) fn from_class_bounds(bounds: Vec<ClassBounds>) -> Self {
        Self { bounds }
    }

    /// Returns the number of bounded classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Returns whether no classes are bounded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Returns the interval for one class, or `None` for foreign ids.
    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<ClassBounds> {
        self.bounds.get(id.index()).copied()
    }

    /// Returns the intervals in catalog order.
    #[must_use]
    pub fn as_slice(&self) -> &[ClassBounds] {
        &self.bounds
    }

    /// Returns whether every count respects its upper bound.
    ///
    /// Lower bounds are deliberately ignored here: they describe eventual
    /// targets and are only enforced at termination.
    #[must_use]
    pub fn within_upper(&self, counts: &CountVector) -> bool {
        self.bounds
            .iter()
            .zip(counts.as_slice())
            .all(|(interval, &count)| count <= interval.upper)
    }

    /// Returns whether every count lies within its closed interval.
    #[must_use]
    pub fn contains(&self, counts: &CountVector) -> bool {
        self.bounds.len() == counts.len()
            && self
                .bounds
                .iter()
                .zip(counts.as_slice())
                .all(|(interval, &count)| interval.contains(count))
    }
}
