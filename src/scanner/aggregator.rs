//! Append-only violation accumulator for one scan.

#![allow(missing_docs)]

use crate::scanner::rules::ValidationError;

/// Collects violations in the order they were found. A new scan starts from a
/// new aggregator; there is no reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationAggregator {
    errors: Vec<ValidationError>,
}

impl ViolationAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_errors<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = ValidationError>,
    {
        self.errors.extend(errors);
    }

    /// `(true, [])` when nothing was ever added, else `(false, errors)`.
    #[must_use]
    pub fn is_valid(&self) -> (bool, &[ValidationError]) {
        (self.errors.is_empty(), &self.errors)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
