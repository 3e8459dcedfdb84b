//! Node path ordering
//!
//! Paths order by document pre-order: compare down to the first differing
//! step, and an ancestor comes before its descendants.

use std::cmp::Ordering;

use super::types::NodePath;

impl Ord for NodePath {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_steps(self.steps(), other.steps())
    }
}

impl PartialOrd for NodePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two sequences of child indices
fn compare_steps(a: &[usize], b: &[usize]) -> Ordering {
    for (step_a, step_b) in a.iter().zip(b.iter()) {
        let cmp = step_a.cmp(step_b);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    // If all compared steps are equal, the longer (deeper) path is "greater"
    a.len().cmp(&b.len())
}

/// Determine if `a` comes before `b` in document order
pub fn is_before(a: &NodePath, b: &NodePath) -> bool {
    a < b
}

/// Determine if `a` comes after `b` in document order
pub fn is_after(a: &NodePath, b: &NodePath) -> bool {
    a > b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(steps: &[usize]) -> NodePath {
        NodePath::new(steps.to_vec())
    }

    #[test]
    fn test_siblings() {
        assert!(is_before(&p(&[0, 1]), &p(&[0, 2])));
        assert!(is_after(&p(&[0, 2]), &p(&[0, 1])));
    }

    #[test]
    fn test_first_difference_decides() {
        // A deeper path under an earlier sibling still comes first
        assert!(p(&[0, 1, 9, 9]) < p(&[0, 2]));
        assert!(p(&[1]) > p(&[0, 5, 5]));
    }

    #[test]
    fn test_ancestor_before_descendant() {
        assert!(p(&[0, 2]) < p(&[0, 2, 0]));
        assert!(NodePath::root() < p(&[0]));
    }

    #[test]
    fn test_equality() {
        assert_eq!(p(&[3, 1]).cmp(&p(&[3, 1])), Ordering::Equal);
    }

    #[test]
    fn test_sort_paths() {
        let mut paths = vec![p(&[1, 0]), p(&[0, 2, 1]), p(&[0, 2]), p(&[0, 10])];
        paths.sort();
        assert_eq!(paths, vec![p(&[0, 2]), p(&[0, 2, 1]), p(&[0, 10]), p(&[1, 0])]);
    }
}
