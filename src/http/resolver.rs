//! Header layer resolution.
//!
//! Three layers contribute request headers to a fetch:
//!
//! | Layer | Owner | Lifetime |
//! |-------|-------|----------|
//! | defaults | factory | shared by every data source the factory creates |
//! | instance overrides | data source | mutable between opens |
//! | per-request | `DataSpec` | one fetch |
//!
//! For each key the value comes from the highest layer defining it:
//! per-request > instance overrides > defaults.

use crate::http::requestproperties::RequestProperties;

/// Final header set for one fetch.
///
/// Ordered: default-layer keys first, then keys introduced by the instance
/// layer, then keys introduced by the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedHeaders {
    entries: Vec<(String, String)>,
}

impl MergedHeaders {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Add a header owned by the data source itself (Range, User-Agent...).
    ///
    /// Overrides an identical key coming from the layers.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            *v = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for MergedHeaders {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Merge the three header layers. Total and side-effect free.
pub fn resolve(
    defaults: &RequestProperties,
    instance_overrides: &RequestProperties,
    per_request: &RequestProperties,
) -> MergedHeaders {
    let mut merged = defaults.snapshot();
    merged.merge(instance_overrides);
    merged.merge(per_request);

    MergedHeaders {
        entries: merged.into_entries(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(entries: &[(&str, &str)]) -> RequestProperties {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_precedence_table() {
        let defaults = layer(&[("0", "Default"), ("1", "Default"), ("2", "Default")]);
        let instance = layer(&[
            ("1", "DefaultHttpDataSource"),
            ("2", "DefaultHttpDataSource"),
            ("3", "DefaultHttpDataSource"),
            ("4", "DefaultHttpDataSource"),
        ]);
        let request = layer(&[("2", "Dataspec"), ("3", "Dataspec"), ("5", "Dataspec")]);

        let merged = resolve(&defaults, &instance, &request);

        assert_eq!(merged.len(), 6);
        assert_eq!(merged.get("0"), Some("Default"));
        assert_eq!(merged.get("1"), Some("DefaultHttpDataSource"));
        assert_eq!(merged.get("2"), Some("Dataspec"));
        assert_eq!(merged.get("3"), Some("Dataspec"));
        assert_eq!(merged.get("4"), Some("DefaultHttpDataSource"));
        assert_eq!(merged.get("5"), Some("Dataspec"));
    }

    #[test]
    fn test_absent_everywhere_is_absent() {
        let merged = resolve(&layer(&[("A", "1")]), &layer(&[]), &layer(&[]));
        assert!(merged.get("B").is_none());
    }

    #[test]
    fn test_empty_layers() {
        let empty = RequestProperties::new();
        assert!(resolve(&empty, &empty, &empty).is_empty());
    }

    #[test]
    fn test_no_case_folding_across_layers() {
        let defaults = layer(&[("X-Token", "default")]);
        let request = layer(&[("x-token", "request")]);
        let merged = resolve(&defaults, &RequestProperties::new(), &request);

        assert_eq!(merged.get("X-Token"), Some("default"));
        assert_eq!(merged.get("x-token"), Some("request"));
    }

    #[test]
    fn test_inputs_untouched() {
        let defaults = layer(&[("A", "1")]);
        let instance = layer(&[("A", "2")]);
        let request = layer(&[("A", "3")]);
        let _ = resolve(&defaults, &instance, &request);

        assert_eq!(defaults.get("A"), Some("1"));
        assert_eq!(instance.get("A"), Some("2"));
        assert_eq!(request.get("A"), Some("3"));
    }

    #[test]
    fn test_latest_value_within_layer_wins() {
        let mut instance = RequestProperties::new();
        instance.set("A", "first");
        instance.set("B", "x");
        instance.set("A", "second");

        let merged = resolve(&layer(&[("A", "default")]), &instance, &layer(&[]));
        assert_eq!(merged.get("A"), Some("second"));
    }

    #[test]
    fn test_with_header_overrides_layer_value() {
        let merged = resolve(&layer(&[("Range", "bytes=9-")]), &layer(&[]), &layer(&[]))
            .with_header("Range", "bytes=0-")
            .with_header("Accept-Encoding", "identity");

        assert_eq!(merged.get("Range"), Some("bytes=0-"));
        assert_eq!(merged.get("Accept-Encoding"), Some("identity"));
        assert_eq!(merged.len(), 2);
    }
}
