//! Coordinate-indexed binary search tree.
//!
//! Boards keep two of these per player: occupied cells (code → ship index)
//! and fired shots (code → result). The coordinate sets involved are small
//! and mostly static, so instead of rebalancing on the fly, bulk loads
//! reorder their sorted input with the recursive-middle algorithm and insert
//! sequentially; the resulting tree has height ⌈log₂(n+1)⌉ and every lookup
//! is O(log n). Incremental inserts are allowed to skew the tree without
//! changing lookup semantics.

use std::cmp::Ordering;

use thiserror::Error;

use crate::coord::Code;

/// Error returned when inserting a code that is already present.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("code {0} is already in the tree")]
pub struct DuplicateCode(pub Code);

struct Node<V> {
    code: Code,
    value: V,
    left: Option<Box<Node<V>>>,
    right: Option<Box<Node<V>>>,
}

impl<V> Node<V> {
    fn leaf(code: Code, value: V) -> Box<Self> {
        Box::new(Self {
            code,
            value,
            left: None,
            right: None,
        })
    }
}

/// Ordered map from coordinate code to a payload.
pub struct CodeTree<V> {
    root: Option<Box<Node<V>>>,
    len: usize,
}

impl<V> CodeTree<V> {
    /// Construct an empty tree.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of codes stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no codes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert a single code. The tree may skew; use [`CodeTree::insert_many`]
    /// when loading a whole sorted set at once.
    pub fn insert(&mut self, code: Code, value: V) -> Result<(), DuplicateCode> {
        insert_node(&mut self.root, code, value)?;
        self.len += 1;
        Ok(())
    }

    /// Bulk-insert a sorted sequence of `(code, value)` pairs.
    ///
    /// The input is reordered by the recursive-middle algorithm (middle
    /// element first, then each half) and inserted sequentially, so loading
    /// an empty tree produces a tree of height ⌈log₂(n+1)⌉.
    pub fn insert_many(&mut self, sorted: Vec<(Code, V)>) -> Result<(), DuplicateCode> {
        debug_assert!(sorted.windows(2).all(|w| w[0].0 < w[1].0));
        let mut slots: Vec<Option<(Code, V)>> = sorted.into_iter().map(Some).collect();
        for idx in middle_order(slots.len()) {
            let (code, value) = slots[idx].take().expect("each index is visited once");
            self.insert(code, value)?;
        }
        Ok(())
    }

    /// Look up the payload stored under `code`.
    pub fn get(&self, code: Code) -> Option<&V> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match code.cmp(&node.code) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
            }
        }
        None
    }

    /// Mutable variant of [`CodeTree::get`].
    pub fn get_mut(&mut self, code: Code) -> Option<&mut V> {
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            match code.cmp(&node.code) {
                Ordering::Equal => return Some(&mut node.value),
                Ordering::Less => cur = node.left.as_deref_mut(),
                Ordering::Greater => cur = node.right.as_deref_mut(),
            }
        }
        None
    }

    /// Whether `code` is present.
    pub fn contains(&self, code: Code) -> bool {
        self.get(code).is_some()
    }

    /// All codes in ascending order.
    pub fn codes_in_order(&self) -> Vec<Code> {
        let mut out = Vec::with_capacity(self.len);
        collect_in_order(self.root.as_deref(), &mut out);
        out
    }

    /// Number of nodes on the longest root-to-leaf path. Empty trees have
    /// height 0.
    pub fn height(&self) -> usize {
        height_of(self.root.as_deref())
    }
}

impl<V> Default for CodeTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_node<V>(
    slot: &mut Option<Box<Node<V>>>,
    code: Code,
    value: V,
) -> Result<(), DuplicateCode> {
    match slot {
        None => {
            *slot = Some(Node::leaf(code, value));
            Ok(())
        }
        Some(node) => match code.cmp(&node.code) {
            Ordering::Equal => Err(DuplicateCode(code)),
            Ordering::Less => insert_node(&mut node.left, code, value),
            Ordering::Greater => insert_node(&mut node.right, code, value),
        },
    }
}

fn collect_in_order<V>(node: Option<&Node<V>>, out: &mut Vec<Code>) {
    if let Some(node) = node {
        collect_in_order(node.left.as_deref(), out);
        out.push(node.code);
        collect_in_order(node.right.as_deref(), out);
    }
}

fn height_of<V>(node: Option<&Node<V>>) -> usize {
    match node {
        None => 0,
        Some(node) => 1 + height_of(node.left.as_deref()).max(height_of(node.right.as_deref())),
    }
}

/// Insertion order over `0..len` that yields a balanced tree: the middle
/// index first, then recursively each half.
fn middle_order(len: usize) -> Vec<usize> {
    fn visit(lo: usize, hi: usize, out: &mut Vec<usize>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        out.push(mid);
        visit(lo, mid, out);
        visit(mid + 1, hi, out);
    }
    let mut out = Vec::with_capacity(len);
    visit(0, len, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(n: Code) -> CodeTree<u32> {
        let mut tree = CodeTree::new();
        tree.insert_many((1..=n).map(|c| (c, c * 10)).collect())
            .unwrap();
        tree
    }

    #[test]
    fn middle_order_matches_reference_sequence() {
        // [1..7] loads as 4, 2, 1, 3, 6, 5, 7.
        assert_eq!(middle_order(7), vec![3, 1, 0, 2, 5, 4, 6]);
    }

    #[test]
    fn bulk_load_height_is_ceil_log2() {
        for n in 1..=128u32 {
            let tree = loaded(n);
            let expected = (u32::BITS - n.leading_zeros()) as usize;
            assert_eq!(tree.height(), expected, "height for n = {n}");
        }
    }

    #[test]
    fn contains_exactly_the_inserted_codes() {
        let tree = loaded(40);
        for code in 1..=40 {
            assert!(tree.contains(code));
            assert_eq!(tree.get(code), Some(&(code * 10)));
        }
        assert!(!tree.contains(0));
        assert!(!tree.contains(41));
    }

    #[test]
    fn in_order_returns_sorted_input() {
        let tree = loaded(33);
        assert_eq!(tree.codes_in_order(), (1..=33).collect::<Vec<_>>());
        assert_eq!(tree.len(), 33);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut tree = loaded(5);
        assert_eq!(tree.insert(3, 0), Err(DuplicateCode(3)));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn incremental_insert_keeps_lookup_semantics() {
        let mut tree = CodeTree::new();
        for code in [101, 102, 103, 104] {
            tree.insert(code, ()).unwrap();
        }
        // Ascending inserts skew the tree but lookups still work.
        assert_eq!(tree.height(), 4);
        assert!(tree.contains(103));
        assert_eq!(tree.codes_in_order(), vec![101, 102, 103, 104]);
    }
}
