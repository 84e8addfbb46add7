//! Per-request context.

use std::sync::Arc;

/// An ordered string → string map threaded through the middleware pipeline.
///
/// One context exists per in-flight request. It is never modified in place:
/// [`adding`](RequestContext::adding) returns a new context and leaves the
/// receiver as it was, so a middleware holding an older value keeps seeing
/// the older entries. Clones share storage and cost one atomic increment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    entries: Arc<Vec<(String, String)>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a copy of this context extended with `entries`.
    ///
    /// A key that already exists keeps its position and takes the new value
    /// in the copy; new keys are appended in the order given.
    ///
    /// ```rust
    /// use hookline::RequestContext;
    ///
    /// let base = RequestContext::new().adding([("user", "alice")]);
    /// let next = base.adding([("user", "bob"), ("role", "admin")]);
    ///
    /// assert_eq!(base.get("user"), Some("alice"));
    /// assert_eq!(next.get("user"), Some("bob"));
    /// assert_eq!(next.len(), 2);
    /// ```
    pub fn adding<I, K, V>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = Vec::clone(&self.entries);
        for (key, value) in entries {
            let (key, value) = (key.into(), value.into());
            match next.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => next.push((key, value)),
            }
        }
        Self { entries: Arc::new(next) }
    }
}
