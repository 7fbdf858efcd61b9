//! Eytzinger (BFS) layout: permute a sorted array into implicit binary-tree
//! order so a descent search walks contiguous memory with predictable branch
//! targets instead of the scattered accesses a sorted-array binary search
//! makes.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// Returns a permutation `perm` of `0..n` such that placing sorted element
/// `i` at `perm[i]` produces the Eytzinger layout: the root (index 0 in the
/// 1-based tree, stored at array index 0) is the sorted array's median, and
/// descending via `2k+1`/`2k+2` visits elements in sorted order.
pub fn order(n: usize) -> Vec<usize> {
    let mut perm = vec![0usize; n];
    let mut next_sorted_index = 0usize;
    visit(&mut perm, &mut next_sorted_index, 0, n);
    perm
}

fn visit(perm: &mut [usize], next_sorted_index: &mut usize, k: usize, n: usize) {
    if k >= n {
        return;
    }
    visit(perm, next_sorted_index, 2 * k + 1, n);
    perm[k] = *next_sorted_index;
    *next_sorted_index += 1;
    visit(perm, next_sorted_index, 2 * k + 2, n);
}

/// Descends the Eytzinger tree of size `n`, calling `cmp(eytzinger_index)` to
/// compare the target against the element stored at that tree position.
/// Returns the tree index of an exact match, or `None`.
pub fn search<F>(n: usize, mut cmp: F) -> Option<usize>
where
    F: FnMut(usize) -> Ordering,
{
    let mut k = 0usize;
    while k < n {
        match cmp(k) {
            Ordering::Equal => return Some(k),
            Ordering::Less => k = 2 * k + 1,
            Ordering::Greater => k = 2 * k + 2,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_a_permutation() {
        for n in 0..40 {
            let perm = order(n);
            assert_eq!(perm.len(), n);
            let mut seen = vec![false; n];
            for &p in &perm {
                assert!(p < n);
                assert!(!seen[p]);
                seen[p] = true;
            }
        }
    }

    #[test]
    fn descent_finds_every_element() {
        for n in 1..50 {
            let perm = order(n);
            // sorted[i] lives at tree index `perm[i]` given `perm[i]` maps
            // sorted-position -> tree-position; invert it to build the
            // array actually stored at each tree slot.
            let mut tree = vec![0usize; n];
            for (sorted_idx, &tree_idx) in perm.iter().enumerate() {
                tree[tree_idx] = sorted_idx;
            }

            for target in 0..n {
                let found = search(n, |k| tree[k].cmp(&target));
                assert_eq!(found.map(|k| tree[k]), Some(target));
            }

            assert_eq!(search(n, |k| tree[k].cmp(&n)), None);
        }
    }
}
