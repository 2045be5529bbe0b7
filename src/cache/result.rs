//! Search Result Module
//!
//! Outcome of a time-bounded lookup.

// == Search Result ==
/// Result of a lookup that may give up once its time budget is spent.
///
/// `OutOfTime` and `InTime(None)` mean different things and callers must
/// handle them separately: the first says nothing about the key, the second
/// confirms the key is absent.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult<V> {
    /// The budget ran out before the search finished. Existence is unknown.
    OutOfTime,
    /// The search finished within budget and its answer is definitive.
    InTime(Option<V>),
}

impl<V> SearchResult<V> {
    /// Returns true if the search gave up.
    pub fn is_out_of_time(&self) -> bool {
        matches!(self, SearchResult::OutOfTime)
    }

    /// Returns true if the search finished within budget.
    pub fn is_in_time(&self) -> bool {
        matches!(self, SearchResult::InTime(_))
    }

    /// Returns true if the value was found.
    pub fn is_hit(&self) -> bool {
        matches!(self, SearchResult::InTime(Some(_)))
    }

    /// Returns the found value, discarding the distinction between a timeout
    /// and a confirmed miss.
    pub fn hit(self) -> Option<V> {
        match self {
            SearchResult::InTime(value) => value,
            SearchResult::OutOfTime => None,
        }
    }

    /// Maps the found value, keeping the variant.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> SearchResult<U> {
        match self {
            SearchResult::OutOfTime => SearchResult::OutOfTime,
            SearchResult::InTime(value) => SearchResult::InTime(value.map(f)),
        }
    }

    /// Borrows the found value.
    pub fn as_ref(&self) -> SearchResult<&V> {
        match self {
            SearchResult::OutOfTime => SearchResult::OutOfTime,
            SearchResult::InTime(value) => SearchResult::InTime(value.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_time_is_not_a_miss() {
        let timeout: SearchResult<u32> = SearchResult::OutOfTime;
        let miss: SearchResult<u32> = SearchResult::InTime(None);

        assert!(timeout.is_out_of_time());
        assert!(!timeout.is_in_time());
        assert!(miss.is_in_time());
        assert!(!miss.is_hit());
        assert_ne!(timeout, miss);
    }

    #[test]
    fn test_hit() {
        let found = SearchResult::InTime(Some(5));
        assert!(found.is_hit());
        assert_eq!(found.hit(), Some(5));
        assert_eq!(SearchResult::<u32>::OutOfTime.hit(), None);
    }

    #[test]
    fn test_map_keeps_variant() {
        assert_eq!(
            SearchResult::InTime(Some(2)).map(|v| v * 10),
            SearchResult::InTime(Some(20))
        );
        assert_eq!(
            SearchResult::<u32>::InTime(None).map(|v| v * 10),
            SearchResult::InTime(None)
        );
        assert_eq!(
            SearchResult::<u32>::OutOfTime.map(|v| v * 10),
            SearchResult::OutOfTime
        );
    }

    #[test]
    fn test_as_ref() {
        let found = SearchResult::InTime(Some("value".to_string()));
        assert_eq!(found.as_ref().map(|s| s.len()), SearchResult::InTime(Some(5)));
    }
}
