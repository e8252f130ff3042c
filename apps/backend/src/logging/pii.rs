//! PII-safe logging helpers.

use std::fmt;

/// Wrapper that masks an email address when formatted for logs: keeps the
/// first character of the local part and the full domain. Values without an
/// `@` are masked entirely.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.find('@') {
            Some(at) if at > 0 => {
                let mut chars = self.0.chars();
                let first = chars.next().unwrap_or('*');
                write!(f, "{first}***{}", &self.0[at..])
            }
            Some(_) => write!(f, "***"),
            None => write!(f, "***"),
        }
    }
}
