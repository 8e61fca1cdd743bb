//! Raw session keys read off a request.

use crate::SessionKind;

/// Up to three session key candidates, one per transport.
///
/// Values are opaque: no format check happens here. A key that isn't in
/// the store is simply a miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Value of the `sid` cookie.
    pub cookie: Option<String>,
    /// Value of the `X-SID` header.
    pub header: Option<String>,
    /// Value of the `sid` query parameter.
    pub query: Option<String>,
}

impl Credentials {
    pub fn with_cookie(mut self, key: impl Into<String>) -> Self {
        self.cookie = Some(key.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>) -> Self {
        self.header = Some(key.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>) -> Self {
        self.query = Some(key.into());
        self
    }

    /// The present candidates in priority order: cookie, header, query.
    ///
    /// Absent and empty values are skipped; the others keep their
    /// relative order.
    pub fn candidates(&self) -> Vec<(&str, SessionKind)> {
        [
            (self.cookie.as_deref(), SessionKind::Cookie),
            (self.header.as_deref(), SessionKind::Header),
            (self.query.as_deref(), SessionKind::Token),
        ]
        .into_iter()
        .filter_map(|(key, kind)| {
            key.filter(|k| !k.is_empty()).map(|k| (k, kind))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates().is_empty()
    }
}
