/// Where a single fetch currently is.
///
/// Transitions run `Unopened → HeadersResolved → ConnectionOpened →
/// ValidatedSuccess | ValidatedFailure → Closed`; `Closed` is reachable from
/// every state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Nothing has happened yet.
    #[default]
    Unopened,

    /// The three header layers have been merged.
    HeadersResolved,

    /// The exchange has been executed; status not yet inspected.
    ConnectionOpened,

    /// 2xx (or an empty range at end of resource); payload readable.
    ValidatedSuccess,

    /// Non-2xx; the error body has been captured and the connection
    /// released.
    ValidatedFailure,

    /// Connection released.
    Closed,
}

impl FetchState {
    /// Whether payload bytes may be read in this state.
    pub fn is_readable(self) -> bool {
        self == FetchState::ValidatedSuccess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unopened() {
        assert_eq!(FetchState::default(), FetchState::Unopened);
    }

    #[test]
    fn test_only_success_is_readable() {
        assert!(FetchState::ValidatedSuccess.is_readable());
        assert!(!FetchState::ValidatedFailure.is_readable());
        assert!(!FetchState::Closed.is_readable());
    }
}
