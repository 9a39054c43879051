//! Observation hooks for tree mutations.
//!
//! An observer is notified at fixed points of a run: tree initialization,
//! every NYT split, every swap, every step of an update pass, and the end
//! of the run. Observers only look; nothing they do can affect the code.

use crate::tree::{AdaptiveTree, NodeId};

/// Hook interface invoked by [`AdaptiveTree`] and the codec driver.
///
/// Every method has an empty default body, so implementors only override
/// the hooks they care about.
pub trait TreeObserver {
    /// The tree was (re)initialized to the single root/NYT node.
    fn on_init(&mut self, _tree: &AdaptiveTree) {}

    /// `symbol` was introduced; `leaf` is its new leaf.
    fn on_split(&mut self, _tree: &AdaptiveTree, _symbol: u8, _leaf: NodeId) {}

    /// `a` and `b` exchanged positions. Called after the swap.
    fn on_swap(&mut self, _tree: &AdaptiveTree, _a: NodeId, _b: NodeId) {}

    /// The update pass is about to process `node`.
    fn on_update_step(&mut self, _tree: &AdaptiveTree, _node: NodeId) {}

    /// The run has finished; `tree` is its final state.
    fn on_finish(&mut self, _tree: &AdaptiveTree) {}
}

impl<T: TreeObserver + ?Sized> TreeObserver for &mut T {
    fn on_init(&mut self, tree: &AdaptiveTree) {
        (**self).on_init(tree)
    }

    fn on_split(&mut self, tree: &AdaptiveTree, symbol: u8, leaf: NodeId) {
        (**self).on_split(tree, symbol, leaf)
    }

    fn on_swap(&mut self, tree: &AdaptiveTree, a: NodeId, b: NodeId) {
        (**self).on_swap(tree, a, b)
    }

    fn on_update_step(&mut self, tree: &AdaptiveTree, node: NodeId) {
        (**self).on_update_step(tree, node)
    }

    fn on_finish(&mut self, tree: &AdaptiveTree) {
        (**self).on_finish(tree)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TreeObserver for NoopObserver {}

/// Observer that reports every event through `tracing`.
///
/// Per-event records go out at `TRACE` level under the `fgk::tree` target;
/// the final tree dump goes out at `DEBUG`. The dump of a large run can be
/// very long, so enable it selectively.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TreeObserver for TracingObserver {
    fn on_init(&mut self, tree: &AdaptiveTree) {
        tracing::trace!(target: "fgk::tree", root = tree.root().index(), "tree initialized");
    }

    fn on_split(&mut self, tree: &AdaptiveTree, symbol: u8, leaf: NodeId) {
        let node = &tree[leaf];
        tracing::trace!(
            target: "fgk::tree",
            symbol,
            leaf = leaf.index(),
            order = node.order(),
            "split nyt"
        );
    }

    fn on_swap(&mut self, tree: &AdaptiveTree, a: NodeId, b: NodeId) {
        tracing::trace!(
            target: "fgk::tree",
            a = a.index(),
            a_order = tree[a].order(),
            a_weight = tree[a].weight(),
            b = b.index(),
            b_order = tree[b].order(),
            b_weight = tree[b].weight(),
            "swap"
        );
    }

    fn on_update_step(&mut self, tree: &AdaptiveTree, node: NodeId) {
        let n = &tree[node];
        tracing::trace!(
            target: "fgk::tree",
            node = node.index(),
            order = n.order(),
            weight = n.weight(),
            leaf = n.is_leaf(),
            "update"
        );
    }

    fn on_finish(&mut self, tree: &AdaptiveTree) {
        tracing::debug!(target: "fgk::tree", "final tree state:\n{tree}");
    }
}
