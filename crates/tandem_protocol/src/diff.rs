//! Diffing two snapshots into a delta.

use crate::delta::Delta;

/// Builds a delta turning `old` into `new`.
///
/// Finds the longest common prefix, then the longest common suffix of what
/// remains (never overlapping the prefix), and replaces the middle. The
/// result has the shape `[Retain?, Delete?, Insert?, Retain?]`. It is not a
/// minimal edit script: one changed region is assumed.
///
/// Identical inputs produce the empty delta.
///
/// # Example
///
/// ```rust
/// use tandem_protocol::{create_delta, Delta};
///
/// let delta = create_delta("hello", "hallo");
/// assert_eq!(delta, Delta::new().retain(1).delete(1).insert("a").retain(3));
/// ```
pub fn create_delta(old: &str, new: &str) -> Delta {
    if old == new {
        return Delta::new();
    }

    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let deleted = old.len() - prefix - suffix;
    let inserted: String = new[prefix..new.len() - suffix].iter().collect();

    Delta::new()
        .retain(prefix)
        .delete(deleted)
        .insert(inserted)
        .retain(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_substitution() {
        let delta = create_delta("hello", "hallo");
        assert_eq!(delta, Delta::new().retain(1).delete(1).insert("a").retain(3));
        assert_eq!(delta.apply("hello"), "hallo");
    }

    #[test]
    fn identical_is_empty() {
        assert!(create_delta("same", "same").is_empty());
        assert!(create_delta("", "").is_empty());
    }

    #[test]
    fn from_and_to_empty() {
        assert_eq!(create_delta("", "abc"), Delta::new().insert("abc"));
        assert_eq!(create_delta("abc", ""), Delta::new().delete(3));
    }

    #[test]
    fn append_and_prepend() {
        assert_eq!(create_delta("ab", "abc"), Delta::new().retain(2).insert("c"));
        assert_eq!(create_delta("bc", "abc"), Delta::new().insert("a").retain(2));
    }

    #[test]
    fn suffix_never_overlaps_prefix() {
        // "aaa" -> "aaaa": the prefix eats all of "aaa", nothing is left for the suffix.
        let delta = create_delta("aaa", "aaaa");
        assert_eq!(delta, Delta::new().retain(3).insert("a"));
        assert_eq!(delta.apply("aaa"), "aaaa");

        let delta = create_delta("abab", "ab");
        assert_eq!(delta.apply("abab"), "ab");
    }

    #[test]
    fn multibyte_boundaries() {
        let delta = create_delta("naïve café", "naive cafe");
        assert_eq!(delta.apply("naïve café"), "naive cafe");
        assert_eq!(delta.ops()[0], crate::Operation::Retain(2));
    }
}
