//! Bounded capture of engine output for failure diagnostics
//!
//! # Invariants
//!
//! - Capacity is fixed at construction time
//! - `len() <= capacity()` always holds
//! - Lines are kept once, in first-seen order; inserting beyond capacity
//!   evicts the oldest line

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct BoundedLineCache {
    lines: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl BoundedLineCache {
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedLineCache capacity must be > 0");
        Self {
            lines: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, line: &str) -> bool {
        self.seen.contains(line)
    }

    /// Record `line`, returning the evicted line if the cache was full
    ///
    /// Repeated lines keep their original position.
    pub fn insert(&mut self, line: impl Into<String>) -> Option<String> {
        let line = line.into();
        if self.seen.contains(&line) {
            return None;
        }

        let evicted = if self.lines.len() >= self.capacity {
            self.lines.pop_front().inspect(|old| {
                self.seen.remove(old);
            })
        } else {
            None
        };

        self.seen.insert(line.clone());
        self.lines.push_back(line);
        evicted
    }

    /// Lines in capture order (oldest first)
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_below_capacity() {
        let mut cache = BoundedLineCache::new(3);
        assert!(cache.insert("one").is_none());
        assert!(cache.insert("two").is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.iter().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut cache = BoundedLineCache::new(3);
        cache.insert("a");
        cache.insert("b");
        cache.insert("c");
        assert_eq!(cache.insert("d"), Some("a".to_string()));

        assert!(!cache.contains("a"));
        assert_eq!(cache.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut cache = BoundedLineCache::new(150);
        for n in 0..1000 {
            cache.insert(format!("line {n}"));
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 150);
        assert!(!cache.contains("line 849"));
        assert!(cache.contains("line 850"));
        assert_eq!(cache.iter().next(), Some("line 850"));
    }

    #[test]
    fn test_duplicate_keeps_first_position() {
        let mut cache = BoundedLineCache::new(3);
        cache.insert("x");
        cache.insert("y");
        assert!(cache.insert("x").is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.into_lines(), vec!["x", "y"]);
    }

    #[test]
    fn test_evicted_line_can_return() {
        let mut cache = BoundedLineCache::new(2);
        cache.insert("a");
        cache.insert("b");
        cache.insert("c");
        assert!(!cache.contains("a"));
        assert_eq!(cache.insert("a"), Some("b".to_string()));
        assert_eq!(cache.into_lines(), vec!["c", "a"]);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_panics() {
        let _ = BoundedLineCache::new(0);
    }
}
