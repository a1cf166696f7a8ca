//! JSON Pointer construction.
//!
//! Tokens are escaped on the way in (`~` becomes `~0`, `/` becomes `~1`), so
//! annotation keys such as `timezone.tzinject.io/injected` can be passed as-is.

use json_patch::jsonptr::{Pointer, PointerBuf};

/// The token addressing the position past the last element of an array.
pub const APPEND: &str = "-";

/// Extends `base` with the given unescaped tokens.
pub fn join<I, T>(base: &Pointer, tokens: I) -> PointerBuf
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut pointer = base.to_buf();
    for token in tokens {
        pointer.push_back(token.as_ref());
    }
    pointer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_escapes_tokens() {
        let pointer = join(Pointer::root(), ["metadata", "annotations", "a~b/c"]);
        assert_eq!(pointer.as_str(), "/metadata/annotations/a~0b~1c");
    }

    #[test]
    fn test_join_extends_prefix() {
        let prefix = join(Pointer::root(), ["items", "2"]);
        let pointer = join(&prefix, ["spec", "volumes", APPEND]);
        assert_eq!(pointer.as_str(), "/items/2/spec/volumes/-");
    }

    #[test]
    fn test_join_without_tokens_is_identity() {
        assert_eq!(join(Pointer::root(), std::iter::empty::<&str>()).as_str(), "");
    }
}
