//! Opaque continuation cursor for the donor-list stream
//!
//! The platform returns a continuation token with every donor page; an empty
//! token marks the end of the stream. The core never inspects or builds token
//! contents - only the fetcher knows how to embed one in a request.

use std::fmt;

/// Position in a campaign's donor stream
///
/// `Head` (start of stream, nothing fetched yet) and `End` (stream exhausted)
/// are distinct values: a run starting fresh begins at `Head`, while a ledger
/// entry recording `End` means the campaign is fully captured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Start of the stream - no continuation token yet
    Head,
    /// Opaque continuation token returned by the platform
    Next(String),
    /// End of stream (the platform encodes this as an empty token)
    End,
}

impl Cursor {
    /// Builds a cursor from the raw token in an API response
    ///
    /// The platform uses the empty string as its end-of-stream sentinel.
    pub fn from_token(token: &str) -> Self {
        if token.is_empty() {
            Self::End
        } else {
            Self::Next(token.to_string())
        }
    }

    /// Returns the token to embed in a request, if any
    ///
    /// `Head` has no token (first request carries no continuation parameter).
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Next(token) => Some(token),
            Self::Head | Self::End => None,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self, Self::Head)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Converts the cursor to its database string representation
    ///
    /// Only cursors observed in a response are ever stored, so `Head` never
    /// reaches the database and shares the empty-string form with `End`.
    pub fn to_db_string(&self) -> &str {
        match self {
            Self::Next(token) => token,
            Self::Head | Self::End => "",
        }
    }

    /// Parses a cursor from its database string representation
    pub fn from_db_string(s: &str) -> Self {
        Self::from_token(s)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => write!(f, "<head>"),
            Self::Next(token) => write!(f, "{}", token),
            Self::End => write!(f, "<end>"),
        }
    }
}
