//! Category distribution of detected threats.

use std::collections::BTreeMap;

use crate::model::ThreatRecord;

/// Category → occurrence count. Keys iterate in lexicographic order.
pub type CategoryTally = BTreeMap<String, usize>;

/// Group threats by exact category string and count each group.
///
/// Unknown categories are counted like any other. The sum of all counts
/// always equals `threats.len()`.
pub fn tally(threats: &[ThreatRecord]) -> CategoryTally {
    let mut counts = CategoryTally::new();
    for threat in threats {
        *counts.entry(threat.category.clone()).or_insert(0) += 1;
    }
    counts
}
