//! Invoice scanner: paginated walker, naming rules, violation aggregation.

pub mod aggregator;
pub mod rules;
pub mod walker;
