//! Key-space partitioning for parallel collection fetches.
//!
//! A logical "fetch everything" request is split into disjoint half-open
//! ranges of a sortable string attribute, derived purely from alphabet
//! knowledge. No remote call is needed: for an alphabet of N characters the
//! partitioner emits exactly N ranges whose boundaries are the alphabet
//! characters themselves, with the first and last ranges open-ended so values
//! outside the common alphabet (digits, punctuation, anything above `z`) are
//! still covered.
//!
//! The union of all ranges is the full key space and no two ranges overlap,
//! so partitions can be fetched concurrently without producing duplicates.

use crate::{
    descriptor::PageRequest,
    error::{Error, Result},
};

/// Default partitioning alphabet: lowercase ASCII letters.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// A half-open key range `[lower, upper)` over a sortable string attribute.
///
/// A `None` bound is open-ended on that side. Comparison is plain lexical
/// byte ordering, matching what directory backends apply to sortable string
/// attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: Option<String>,
    pub upper: Option<String>,
}

impl KeyRange {
    /// The range covering the entire key space.
    pub const fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// Whether `key` falls inside this range.
    pub fn contains(&self, key: &str) -> bool {
        if let Some(lower) = &self.lower {
            if key < lower.as_str() {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            if key >= upper.as_str() {
                return false;
            }
        }
        true
    }
}

/// One disjoint sub-range of the logical collection, fetched independently.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Position within the ordered partition sequence.
    pub index: usize,
    /// Attribute the key space is partitioned on.
    pub attribute: String,
    /// The half-open range this partition covers.
    pub range: KeyRange,
}

impl Partition {
    /// The initial descriptor for this partition: no cursor, attempt zero.
    pub fn initial_request(&self, page_size: usize) -> PageRequest {
        PageRequest {
            partition: self.index,
            attribute: self.attribute.clone(),
            range: self.range.clone(),
            page_size,
            cursor: None,
            attempt: 0,
        }
    }
}

/// Describes how to partition a collection: which sortable attribute to cut
/// on, and the alphabet supplying the cut points.
#[derive(Clone, Debug)]
pub struct PartitionSpec {
    attribute: String,
    alphabet: Vec<char>,
}

impl PartitionSpec {
    /// Partition on `attribute` using the default lowercase alphabet.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            alphabet: DEFAULT_ALPHABET.chars().collect(),
        }
    }

    /// Replaces the cut-point alphabet. Characters must be strictly
    /// increasing; this is validated in [`PartitionSpec::partitions`].
    pub fn with_alphabet(mut self, alphabet: impl IntoIterator<Item = char>) -> Self {
        self.alphabet = alphabet.into_iter().collect();
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Computes the ordered, disjoint partition sequence.
    ///
    /// For alphabet `c1 < c2 < … < cN` the ranges are `(.., c2)`, `[c2, c3)`,
    /// …, `[cN, ..)`: N ranges, both ends open-ended. A single-character
    /// alphabet degenerates to one unbounded partition, which is acceptable
    /// for low-cardinality attributes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the attribute is empty, the
    /// alphabet is empty, or the alphabet is not strictly increasing.
    pub fn partitions(&self) -> Result<Vec<Partition>> {
        if self.attribute.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "partition attribute must not be empty".into(),
            });
        }
        if self.alphabet.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "partition alphabet must not be empty".into(),
            });
        }
        if self.alphabet.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig {
                reason: "partition alphabet must be strictly increasing".into(),
            });
        }

        // Boundaries are every alphabet character except the first: the
        // leading range is open below, the trailing range open above.
        let bounds: Vec<String> = self.alphabet[1..].iter().map(|c| c.to_string()).collect();

        let mut partitions = Vec::with_capacity(self.alphabet.len());
        for index in 0..self.alphabet.len() {
            let lower = if index == 0 {
                None
            } else {
                Some(bounds[index - 1].clone())
            };
            let upper = bounds.get(index).cloned();
            partitions.push(Partition {
                index,
                attribute: self.attribute.clone(),
                range: KeyRange { lower, upper },
            });
        }
        Ok(partitions)
    }
}
