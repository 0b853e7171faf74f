//! Cache key derivation.
//!
//! A key is the concatenation of one segment per argument:
//!
//! ```text
//! <type name>[<byte length of repr>]<Debug repr>
//! ```
//!
//! The `Debug` representation follows `Box`, `Arc` and references to the
//! pointed-to value, so two distinct allocations holding equal values produce
//! the same key. The length prefix keeps segments apart whatever characters
//! the representation contains.

use std::fmt::Write;

use crate::callable::Arg;

/// Derive the canonical key for an argument list.
pub fn derive(args: &[Arg]) -> String {
    let mut key = String::new();
    let mut repr = String::new();

    for arg in args {
        repr.clear();
        // Writing into a String cannot fail.
        let _ = write!(repr, "{:?}", arg);
        let _ = write!(key, "{}[{}]{}", arg.type_desc(), repr.len(), repr);
    }

    key
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::args;

    #[derive(Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug)]
    struct Line {
        from: Point,
        to: Point,
    }

    #[test]
    fn test_fresh_allocations_share_key() {
        let a = derive(&args![Box::new(Point { x: 1, y: 2 })]);
        let b = derive(&args![Box::new(Point { x: 1, y: 2 })]);
        let c = derive(&args![Box::new(Point { x: 1, y: 3 })]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_nested_fields_are_expanded() {
        let line = |y| Line {
            from: Point { x: 0, y: 0 },
            to: Point { x: 1, y },
        };

        assert_eq!(
            derive(&args![Arc::new(line(5))]),
            derive(&args![Arc::new(line(5))])
        );
        assert_ne!(
            derive(&args![Arc::new(line(5))]),
            derive(&args![Arc::new(line(6))])
        );
    }

    #[test]
    fn test_argument_boundaries() {
        assert_ne!(derive(&args![12u32, 3u32]), derive(&args![1u32, 23u32]));
        assert_ne!(
            derive(&args![String::from("a"), String::from("bc")]),
            derive(&args![String::from("ab"), String::from("c")])
        );
    }

    #[test]
    fn test_type_is_part_of_key() {
        assert_ne!(derive(&args![1u32]), derive(&args![1u64]));
        assert_ne!(derive(&args![1u32]), derive(&args![Box::new(1u32)]));
    }

    #[test]
    fn test_ordered_map_is_deterministic() {
        let mut first = BTreeMap::new();
        first.insert("b", 2);
        first.insert("a", 1);

        let mut second = BTreeMap::new();
        second.insert("a", 1);
        second.insert("b", 2);

        assert_eq!(derive(&args![first]), derive(&args![second]));
    }

    #[test]
    fn test_empty_args() {
        assert_eq!(derive(&args![]), "");
    }
}
