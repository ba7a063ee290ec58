//! Immutable request parameters with an explicit page cursor

/// Query string template for one API endpoint.
///
/// Built once per unit of work; the page walker derives a per-request copy
/// with [`Query::with_page`] instead of mutating a shared parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(&'static str, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value for the same key
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Copy of this template pointing at `page` (1-based)
    pub fn with_page(&self, page: u64) -> Self {
        self.clone().with("page", page)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Page size, if the template carries a numeric `limit`
    pub fn limit(&self) -> Option<u64> {
        self.get("limit").and_then(|v| v.parse().ok())
    }

    pub fn page(&self) -> Option<u64> {
        self.get("page").and_then(|v| v.parse().ok())
    }

    /// Key/value pairs in insertion order (for `reqwest::RequestBuilder::query`)
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_replaces_existing_key() {
        let q = Query::new().with("limit", 25).with("limit", 10);
        assert_eq!(q.pairs().len(), 1);
        assert_eq!(q.limit(), Some(10));
    }

    #[test]
    fn with_page_leaves_template_untouched() {
        let template = Query::new().with("format", "json").with("page", 1);
        let third = template.with_page(3);
        assert_eq!(template.page(), Some(1));
        assert_eq!(third.page(), Some(3));
        assert_eq!(third.get("format"), Some("json"));
    }

    #[test]
    fn insertion_order_kept() {
        let q = Query::new()
            .with("branch", true)
            .with("hospitalType", false)
            .with("limit", 25);
        let keys: Vec<_> = q.pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["branch", "hospitalType", "limit"]);
        assert_eq!(q.get("branch"), Some("true"));
    }

    #[test]
    fn non_numeric_limit_is_none() {
        let q = Query::new().with("limit", "many");
        assert_eq!(q.limit(), None);
        assert_eq!(q.page(), None);
    }
}
