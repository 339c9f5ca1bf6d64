//! Request property stores.
//!
//! [`RequestProperties`] is an ordered name → value registry for outgoing
//! request headers. Names are opaque: they keep their casing and are matched
//! by exact equality, so `"Accept"` and `"accept"` are two different keys.
//! [`SharedRequestProperties`] wraps a store behind a lock so the defaults
//! layer can be shared by every data source a factory creates.

use std::sync::{Arc, PoisonError, RwLock};

/// Ordered header name → value map with exact-match keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestProperties {
    entries: Vec<(String, String)>,
}

impl RequestProperties {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `name` to `value`, overwriting in place if the key exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some((_, v)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            *v = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Remove `name`, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Overlay every entry of `other` onto this store; `other` wins on
    /// shared keys.
    pub fn merge(&mut self, other: &RequestProperties) {
        for (name, value) in &other.entries {
            self.set(name.as_str(), value.as_str());
        }
    }

    /// Replace the whole content with `other`.
    pub fn replace_all(&mut self, other: RequestProperties) {
        self.entries = other.entries;
    }

    /// An independent copy of the current content.
    pub fn snapshot(&self) -> RequestProperties {
        self.clone()
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

    pub(crate) fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl<K, V> FromIterator<(K, V)> for RequestProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = RequestProperties::new();
        props.extend(iter);
        props
    }
}

impl<K, V> Extend<(K, V)> for RequestProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

/// A [`RequestProperties`] store shared between owners.
///
/// Clones observe the same content. Readers should take a
/// [`snapshot`](Self::snapshot) rather than hold the lock; a writer racing
/// an in-flight fetch may or may not be observed by that fetch.
#[derive(Debug, Clone, Default)]
pub struct SharedRequestProperties {
    inner: Arc<RwLock<RequestProperties>>,
}

impl SharedRequestProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(name, value);
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn replace_all(&self, properties: RequestProperties) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace_all(properties);
    }

    pub fn snapshot(&self) -> RequestProperties {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}

impl From<RequestProperties> for SharedRequestProperties {
    fn from(properties: RequestProperties) -> Self {
        Self {
            inner: Arc::new(RwLock::new(properties)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut props = RequestProperties::new();
        props.set("Content-Type", "application/json");
        assert_eq!(props.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut props = RequestProperties::new();
        props.set("Accept", "text/html");
        assert!(props.get("accept").is_none());

        props.set("accept", "*/*");
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("Accept"), Some("text/html"));
    }

    #[test]
    fn test_keys_are_not_trimmed() {
        let mut props = RequestProperties::new();
        props.set(" X-Pad ", "1");
        assert!(props.get("X-Pad").is_none());
        assert_eq!(props.get(" X-Pad "), Some("1"));
    }

    #[test]
    fn test_overwrite_keeps_single_entry_and_position() {
        let mut props = RequestProperties::new();
        props.set("A", "1");
        props.set("B", "2");
        props.set("A", "3");

        let entries: Vec<_> = props.iter().collect();
        assert_eq!(entries, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_remove() {
        let mut props = RequestProperties::new();
        props.set("X-Custom", "value");
        assert_eq!(props.remove("X-Custom").as_deref(), Some("value"));
        assert!(props.get("X-Custom").is_none());
        assert!(props.remove("X-Custom").is_none());
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base: RequestProperties = [("A", "base"), ("B", "base")].into_iter().collect();
        let overlay: RequestProperties = [("B", "overlay"), ("C", "overlay")].into_iter().collect();
        base.merge(&overlay);

        assert_eq!(base.get("A"), Some("base"));
        assert_eq!(base.get("B"), Some("overlay"));
        assert_eq!(base.get("C"), Some("overlay"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut props = RequestProperties::new();
        props.set("A", "1");
        let snapshot = props.snapshot();
        props.set("A", "2");
        assert_eq!(snapshot.get("A"), Some("1"));
    }

    #[test]
    fn test_shared_clones_observe_writes() {
        let shared = SharedRequestProperties::new();
        let other = shared.clone();
        other.set("Token", "abc");
        assert_eq!(shared.snapshot().get("Token"), Some("abc"));

        shared.clear();
        assert!(other.snapshot().is_empty());
    }

    #[test]
    fn test_shared_replace_all() {
        let shared: SharedRequestProperties =
            RequestProperties::from_iter([("Old", "1")]).into();
        shared.replace_all(RequestProperties::from_iter([("New", "2")]));

        let snapshot = shared.snapshot();
        assert!(snapshot.get("Old").is_none());
        assert_eq!(snapshot.get("New"), Some("2"));
    }

    #[test]
    fn test_default_is_empty() {
        let props = RequestProperties::default();
        assert!(props.is_empty());
        assert!(SharedRequestProperties::default().snapshot().is_empty());
    }
}
