//! Indirect references inside configuration strings.
//!
//! A string value with one of the known scheme prefixes is not a literal but
//! a pointer to something the container resolves:
//!
//! - `named:<name>` resolves the named object `<name>`
//! - `make:<type>` builds a fresh anonymous object of the registered type
//! - `post:<message>` parses a [`Message`](crate::Message)
//!
//! Anything else is a plain string.

/// Scheme prefix for named object references.
pub const NAMED_SCHEME: &str = "named:";
/// Scheme prefix for anonymous object construction.
pub const MAKE_SCHEME: &str = "make:";
/// Scheme prefix for message literals.
pub const POST_SCHEME: &str = "post:";

/// A parsed indirect reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `named:<name>`
    Named(&'a str),
    /// `make:<type>`
    Make(&'a str),
    /// `post:<message text>`
    Post(&'a str),
}

impl<'a> Reference<'a> {
    /// Parse a string value. Returns `None` for plain strings, including a
    /// bare scheme with nothing after it.
    pub fn parse(text: &'a str) -> Option<Self> {
        let (make, body): (fn(&'a str) -> Self, &'a str) =
            if let Some(rest) = text.strip_prefix(NAMED_SCHEME) {
                (Reference::Named, rest)
            } else if let Some(rest) = text.strip_prefix(MAKE_SCHEME) {
                (Reference::Make, rest)
            } else if let Some(rest) = text.strip_prefix(POST_SCHEME) {
                (Reference::Post, rest)
            } else {
                return None;
            };
        let body = body.trim();
        if body.is_empty() { None } else { Some(make(body)) }
    }

    /// The text after the scheme prefix.
    pub fn body(&self) -> &'a str {
        match self {
            Reference::Named(body) | Reference::Make(body) | Reference::Post(body) => body,
        }
    }
}
