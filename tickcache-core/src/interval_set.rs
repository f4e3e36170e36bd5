//! Mergeable set of closed integer intervals.
//!
//! The set is a binary search tree ordered by interval start. Every node holds
//! an already-merged interval, and the tree never stores two intervals that
//! overlap or touch (`a.end + 1 == b.start`): such intervals are coalesced on
//! insert. The tree is not rebalanced; stored intervals tend to coalesce, so
//! the node count stays small in practice.

use std::fmt;

use crate::TimeInterval;

type Link = Option<Box<Node>>;

#[derive(Clone)]
struct Node {
    iv: TimeInterval,
    left: Link,
    right: Link,
}

impl Node {
    fn leaf(iv: TimeInterval) -> Box<Self> {
        Box::new(Self {
            iv,
            left: None,
            right: None,
        })
    }
}

/// Ordered set of pairwise disjoint, non-adjacent closed intervals.
#[derive(Clone, Default)]
pub struct IntervalSet {
    root: Link,
}

impl IntervalSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Insert `iv`, merging it with every stored interval it overlaps or touches.
    ///
    /// Returns whether the covered region changed.
    pub fn add(&mut self, iv: TimeInterval) -> bool {
        let (root, changed) = insert(self.root.take(), iv);
        self.root = root;
        changed
    }

    /// Subtract `iv` from the set, shrinking, splitting or deleting stored intervals.
    pub fn remove(&mut self, iv: TimeInterval) {
        self.root = remove(self.root.take(), iv);
    }

    /// Keep only the parts of stored intervals that lie inside `iv`.
    pub fn cut(&mut self, iv: TimeInterval) {
        self.root = cut(self.root.take(), iv);
    }

    /// Stored intervals intersecting `iv`, clipped to `iv`, in ascending order.
    #[must_use]
    pub fn query(&self, iv: TimeInterval) -> Vec<TimeInterval> {
        let mut out = Vec::new();
        collect(self.root.as_deref(), iv, &mut out);
        out
    }

    /// Sub-intervals of `iv` that the set does not cover, in ascending order.
    #[must_use]
    pub fn gaps(&self, iv: TimeInterval) -> Vec<TimeInterval> {
        let mut out = Vec::new();
        let mut cursor = iv.start();
        for covered in self.query(iv) {
            if covered.start() > cursor {
                out.push(TimeInterval::new(cursor, covered.start() - 1));
            }
            if covered.end() == i64::MAX {
                return out;
            }
            cursor = covered.end() + 1;
        }
        if cursor <= iv.end() {
            out.push(TimeInterval::new(cursor, iv.end()));
        }
        out
    }

    /// True if a single stored interval contains all of `iv`.
    #[must_use]
    pub fn covers(&self, iv: TimeInterval) -> bool {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if iv.start() < node.iv.start() {
                cur = node.left.as_deref();
            } else if iv.start() > node.iv.end() {
                cur = node.right.as_deref();
            } else {
                return node.iv.contains_interval(&iv);
            }
        }
        false
    }

    /// Number of stored intervals.
    #[must_use]
    pub fn size(&self) -> usize {
        fn count(link: Option<&Node>) -> usize {
            link.map_or(0, |n| {
                1 + count(n.left.as_deref()) + count(n.right.as_deref())
            })
        }
        count(self.root.as_deref())
    }

    /// True if nothing is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// All stored intervals in ascending order.
    #[must_use]
    pub fn all(&self) -> Vec<TimeInterval> {
        let mut out = Vec::new();
        in_order(self.root.as_deref(), &mut out);
        out
    }

    /// Smallest interval covering everything stored.
    #[must_use]
    pub fn span(&self) -> Option<TimeInterval> {
        let mut first = self.root.as_deref()?;
        while let Some(l) = first.left.as_deref() {
            first = l;
        }
        let mut last = self.root.as_deref()?;
        while let Some(r) = last.right.as_deref() {
            last = r;
        }
        Some(TimeInterval::new(first.iv.start(), last.iv.end()))
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.root = None;
    }
}

impl fmt::Debug for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.all()).finish()
    }
}

impl PartialEq for IntervalSet {
    fn eq(&self, other: &Self) -> bool {
        self.all() == other.all()
    }
}

impl Eq for IntervalSet {}

impl Extend<TimeInterval> for IntervalSet {
    fn extend<I: IntoIterator<Item = TimeInterval>>(&mut self, iter: I) {
        for iv in iter {
            self.add(iv);
        }
    }
}

impl FromIterator<TimeInterval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = TimeInterval>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl From<TimeInterval> for IntervalSet {
    fn from(iv: TimeInterval) -> Self {
        Self {
            root: Some(Node::leaf(iv)),
        }
    }
}

fn insert(link: Link, iv: TimeInterval) -> (Link, bool) {
    let Some(mut node) = link else {
        return (Some(Node::leaf(iv)), true);
    };
    let changed = if iv.end().saturating_add(1) < node.iv.start() {
        let (left, changed) = insert(node.left.take(), iv);
        node.left = left;
        changed
    } else if node.iv.end().saturating_add(1) < iv.start() {
        let (right, changed) = insert(node.right.take(), iv);
        node.right = right;
        changed
    } else if node.iv.contains_interval(&iv) {
        false
    } else {
        // Widen this node, then swallow whatever the widened interval now
        // reaches on either side.
        let widened = node.iv.hull(&iv);
        let (left, start) = absorb_left(node.left.take(), widened.start());
        let (right, end) = absorb_right(node.right.take(), widened.end());
        node.left = left;
        node.right = right;
        node.iv = TimeInterval::new(start, end);
        true
    };
    (Some(node), changed)
}

/// Remove every node of a left subtree that merges with an interval starting
/// at `start`; returns the pruned subtree and the extended start.
fn absorb_left(link: Link, start: i64) -> (Link, i64) {
    let Some(mut node) = link else {
        return (None, start);
    };
    if node.iv.end().saturating_add(1) >= start {
        // Its right subtree lies between this node and the widened interval.
        absorb_left(node.left.take(), start.min(node.iv.start()))
    } else {
        let (right, start) = absorb_left(node.right.take(), start);
        node.right = right;
        (Some(node), start)
    }
}

/// Mirror of [`absorb_left`] for a right subtree.
fn absorb_right(link: Link, end: i64) -> (Link, i64) {
    let Some(mut node) = link else {
        return (None, end);
    };
    if node.iv.start() <= end.saturating_add(1) {
        absorb_right(node.right.take(), end.max(node.iv.end()))
    } else {
        let (left, end) = absorb_right(node.left.take(), end);
        node.left = left;
        (Some(node), end)
    }
}

fn remove(link: Link, iv: TimeInterval) -> Link {
    let mut node = link?;
    if iv.end() < node.iv.start() {
        node.left = remove(node.left.take(), iv);
        return Some(node);
    }
    if iv.start() > node.iv.end() {
        node.right = remove(node.right.take(), iv);
        return Some(node);
    }
    if iv.start() < node.iv.start() {
        node.left = remove(node.left.take(), iv);
    }
    if iv.end() > node.iv.end() {
        node.right = remove(node.right.take(), iv);
    }
    let below = (node.iv.start() < iv.start())
        .then(|| TimeInterval::new(node.iv.start(), iv.start() - 1));
    let above =
        (iv.end() < node.iv.end()).then(|| TimeInterval::new(iv.end() + 1, node.iv.end()));
    match (below, above) {
        (Some(below), Some(above)) => {
            // Split: the upper half becomes the root of the right subtree.
            node.iv = below;
            node.right = Some(Box::new(Node {
                iv: above,
                left: None,
                right: node.right.take(),
            }));
            Some(node)
        }
        (Some(rest), None) | (None, Some(rest)) => {
            node.iv = rest;
            Some(node)
        }
        (None, None) => delete(node),
    }
}

fn delete(mut node: Box<Node>) -> Link {
    match (node.left.take(), node.right.take()) {
        (None, right) => right,
        (left, None) => left,
        (Some(left), Some(right)) => {
            let (successor, rest) = take_min(right);
            Some(Box::new(Node {
                iv: successor,
                left: Some(left),
                right: rest,
            }))
        }
    }
}

fn take_min(mut node: Box<Node>) -> (TimeInterval, Link) {
    match node.left.take() {
        None => (node.iv, node.right.take()),
        Some(left) => {
            let (min, rest) = take_min(left);
            node.left = rest;
            (min, Some(node))
        }
    }
}

fn cut(link: Link, iv: TimeInterval) -> Link {
    let mut node = link?;
    if node.iv.end() < iv.start() {
        return cut(node.right.take(), iv);
    }
    if node.iv.start() > iv.end() {
        return cut(node.left.take(), iv);
    }
    node.iv = node.iv.intersection(&iv)?;
    node.left = cut(node.left.take(), iv);
    node.right = cut(node.right.take(), iv);
    Some(node)
}

fn collect(link: Option<&Node>, iv: TimeInterval, out: &mut Vec<TimeInterval>) {
    let Some(node) = link else { return };
    if iv.start() < node.iv.start() {
        collect(node.left.as_deref(), iv, out);
    }
    if let Some(clipped) = node.iv.intersection(&iv) {
        out.push(clipped);
    }
    if iv.end() > node.iv.end() {
        collect(node.right.as_deref(), iv, out);
    }
}

fn in_order(link: Option<&Node>, out: &mut Vec<TimeInterval>) {
    let Some(node) = link else { return };
    in_order(node.left.as_deref(), out);
    out.push(node.iv);
    in_order(node.right.as_deref(), out);
}
