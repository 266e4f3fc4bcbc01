//! The fixed set of industries percentiles are computed for.

use serde::{Deserialize, Serialize};

/// Industries recognized by the default configuration.
pub const DEFAULT_INDUSTRIES: [&str; 4] = ["clothing", "food", "cars", "hair care"];

/// Ordered, closed set of industry labels.
///
/// Order is the configured order and is the order binning passes run in.
/// Labels are matched exactly (case-sensitive, no trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndustrySet(Vec<String>);

impl IndustrySet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndustrySet(labels.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|known| known == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn labels(&self) -> &[String] {
        &self.0
    }
}

impl Default for IndustrySet {
    fn default() -> Self {
        IndustrySet::new(DEFAULT_INDUSTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_matches_known_industries() {
        let set = IndustrySet::default();
        assert_eq!(set.len(), 4);
        assert!(set.contains("hair care"));
        assert!(!set.contains("electronics"));
        assert!(!set.contains("Food"));
    }

    #[test]
    fn deserializes_from_plain_list() {
        let set: IndustrySet = serde_json::from_str(r#"["food","cars"]"#).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["food", "cars"]);
    }
}
