/// FGK adaptive Huffman tree.
///
/// Nodes are stored in a flat arena and addressed by [`NodeId`]. The tree
/// starts as a single NYT ("not yet transmitted") leaf which is also the
/// root. Introducing a symbol splits the NYT into an internal node with a
/// fresh NYT on the left and the symbol's leaf on the right. Every symbol
/// occurrence then runs [`AdaptiveTree::update`], which walks from the leaf
/// to the root, swapping each node with the highest-order node of equal
/// weight before incrementing it. That keeps the sibling property: read in
/// increasing `order`, node weights never decrease.
///
/// Encoder and decoder drive identical trees with identical symbol
/// sequences, so any divergence in tie-breaking or swap preconditions
/// corrupts every following code.
use std::fmt;
use std::ops::Index;

use crate::observer::{NoopObserver, TreeObserver};
use crate::{FgkError, FgkResult};

/// Number of distinct symbols (byte values).
pub const ALPHABET_SIZE: usize = 256;

/// Order of the initial root. Every split consumes two lower orders.
pub const ROOT_ORDER: i32 = (2 * ALPHABET_SIZE - 1) as i32;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the adaptive tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Bound symbol; `None` for internal nodes and the NYT leaf.
    symbol: Option<u8>,
    /// Occurrence count of the subtree.
    weight: u32,
    /// Unique rank used to break weight ties.
    order: i32,
    /// Parent link (`None` for the root).
    parent: Option<NodeId>,
    /// `[left, right]` for internal nodes, `None` for leaves.
    children: Option<[NodeId; 2]>,
}

impl Node {
    fn leaf(symbol: Option<u8>, order: i32, parent: Option<NodeId>) -> Self {
        Node {
            symbol,
            weight: 0,
            order,
            parent,
            children: None,
        }
    }

    pub fn symbol(&self) -> Option<u8> {
        self.symbol
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        self.children.map(|c| c[0])
    }

    pub fn right(&self) -> Option<NodeId> {
        self.children.map(|c| c[1])
    }

    /// Child reached by branch bit `bit` (left on 0, right on 1).
    pub fn child(&self, bit: bool) -> Option<NodeId> {
        self.children.map(|c| c[bit as usize])
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// The FGK tree plus its symbol → leaf index.
#[derive(Debug, Clone)]
pub struct AdaptiveTree {
    nodes: Vec<Node>,
    nyt: Option<NodeId>,
    leaves: [Option<NodeId>; ALPHABET_SIZE],
    symbol_count: usize,
}

impl Default for AdaptiveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for AdaptiveTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl AdaptiveTree {
    const ROOT: NodeId = NodeId(0);

    /// Create a tree holding only the root/NYT node.
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(2 * ALPHABET_SIZE + 1);
        nodes.push(Node::leaf(None, ROOT_ORDER, None));
        AdaptiveTree {
            nodes,
            nyt: Some(Self::ROOT),
            leaves: [None; ALPHABET_SIZE],
            symbol_count: 0,
        }
    }

    /// Discard every node and return to the initial single-node state.
    pub fn reset(&mut self) {
        self.reset_observed(&mut NoopObserver);
    }

    pub fn reset_observed<O: TreeObserver + ?Sized>(&mut self, observer: &mut O) {
        // Clear the index first so no lookup can reach a dropped node.
        self.leaves = [None; ALPHABET_SIZE];
        self.symbol_count = 0;
        self.nodes.clear();
        self.nodes.push(Node::leaf(None, ROOT_ORDER, None));
        self.nyt = Some(Self::ROOT);
        observer.on_init(self);
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// The current NYT node, or `None` once all 256 symbols are present.
    pub fn nyt(&self) -> Option<NodeId> {
        self.nyt
    }

    /// Leaf bound to `symbol`, if the symbol has been introduced.
    pub fn leaf(&self, symbol: u8) -> Option<NodeId> {
        self.leaves[symbol as usize]
    }

    pub fn node(&self, id: NodeId) -> FgkResult<&Node> {
        self.nodes.get(id.0).ok_or(FgkError::InvalidNode(id.0))
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of distinct symbols introduced so far.
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    /// Iterate over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// True if `ancestor` lies on the path from `node` to the root.
    /// A node counts as its own ancestor.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> FgkResult<bool> {
        self.node(ancestor)?;
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return Ok(true);
            }
            cur = self.node(id)?.parent;
        }
        Ok(false)
    }

    /// Node with weight exactly `weight` and the highest order, if any.
    pub fn leader(&self, weight: u32) -> Option<NodeId> {
        self.iter()
            .filter(|(_, n)| n.weight == weight)
            .max_by_key(|(_, n)| n.order)
            .map(|(id, _)| id)
    }

    /// Branch decisions from the root down to `id`, appended to `out`
    /// (`false` = left, `true` = right). The root yields no bits.
    pub fn path_to(&self, id: NodeId, out: &mut Vec<bool>) -> FgkResult<()> {
        self.node(id)?;
        let start = out.len();
        let mut cur = id;
        while let Some(parent) = self.nodes[cur.0].parent {
            out.push(self.nodes[parent.0].right() == Some(cur));
            cur = parent;
        }
        out[start..].reverse();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Exchange the positions of `a` and `b`, together with their orders.
    ///
    /// Weights stay with the nodes. Returns `Ok(false)` without touching the
    /// tree when the nodes are equal, when either is the root, or when one
    /// is an ancestor of the other.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> FgkResult<bool> {
        self.swap_observed(a, b, &mut NoopObserver)
    }

    pub fn swap_observed<O: TreeObserver + ?Sized>(
        &mut self,
        a: NodeId,
        b: NodeId,
        observer: &mut O,
    ) -> FgkResult<bool> {
        let parent_a = self.node(a)?.parent;
        let parent_b = self.node(b)?.parent;
        if a == b {
            return Ok(false);
        }
        let (Some(pa), Some(pb)) = (parent_a, parent_b) else {
            return Ok(false);
        };
        if self.is_ancestor(a, b)? || self.is_ancestor(b, a)? {
            return Ok(false);
        }

        let side_a = self.side_of(pa, a)?;
        let side_b = self.side_of(pb, b)?;
        self.set_child(pa, side_a, b);
        self.set_child(pb, side_b, a);
        self.nodes[a.0].parent = Some(pb);
        self.nodes[b.0].parent = Some(pa);

        let order_a = self.nodes[a.0].order;
        self.nodes[a.0].order = self.nodes[b.0].order;
        self.nodes[b.0].order = order_a;

        observer.on_swap(self, a, b);
        Ok(true)
    }

    /// Record one occurrence of the node `id` (normally a leaf).
    pub fn update(&mut self, id: NodeId) -> FgkResult<()> {
        self.update_observed(id, &mut NoopObserver)
    }

    pub fn update_observed<O: TreeObserver + ?Sized>(
        &mut self,
        id: NodeId,
        observer: &mut O,
    ) -> FgkResult<()> {
        self.node(id)?;
        let mut cur = Some(id);
        while let Some(node) = cur {
            observer.on_update_step(self, node);
            let weight = self.nodes[node.0].weight;
            if let Some(leader) = self.leader(weight) {
                if leader != node && !self.is_ancestor(node, leader)? {
                    self.swap_observed(node, leader, observer)?;
                }
            }
            self.nodes[node.0].weight += 1;
            cur = self.nodes[node.0].parent;
        }
        Ok(())
    }

    /// Introduce `symbol`: the NYT becomes an internal node whose left child
    /// is the new NYT and whose right child is the symbol's leaf.
    ///
    /// Returns the new leaf. The caller must follow up with
    /// [`update`](Self::update) on it.
    pub fn split_nyt(&mut self, symbol: u8) -> FgkResult<NodeId> {
        self.split_nyt_observed(symbol, &mut NoopObserver)
    }

    pub fn split_nyt_observed<O: TreeObserver + ?Sized>(
        &mut self,
        symbol: u8,
        observer: &mut O,
    ) -> FgkResult<NodeId> {
        if self.leaves[symbol as usize].is_some() {
            return Err(FgkError::SymbolAlreadyPresent(symbol));
        }
        let nyt = self.nyt.ok_or(FgkError::AlphabetExhausted)?;
        let order = self.nodes[nyt.0].order;

        let new_nyt = NodeId(self.nodes.len());
        let leaf = NodeId(self.nodes.len() + 1);
        self.nodes.push(Node::leaf(None, order - 2, Some(nyt)));
        self.nodes.push(Node::leaf(Some(symbol), order - 1, Some(nyt)));
        self.nodes[nyt.0].children = Some([new_nyt, leaf]);

        self.leaves[symbol as usize] = Some(leaf);
        self.symbol_count += 1;
        // The left child is still created for the last symbol so that the
        // tree shape does not depend on alphabet exhaustion; it just stops
        // being the NYT.
        self.nyt = (self.symbol_count < ALPHABET_SIZE).then_some(new_nyt);

        observer.on_split(self, symbol, leaf);
        Ok(leaf)
    }

    fn side_of(&self, parent: NodeId, child: NodeId) -> FgkResult<usize> {
        match self.nodes[parent.0].children {
            Some([left, _]) if left == child => Ok(0),
            Some([_, right]) if right == child => Ok(1),
            _ => Err(FgkError::BrokenInvariant(format!(
                "node {} is not a child of its parent {}",
                child.0, parent.0
            ))),
        }
    }

    fn set_child(&mut self, parent: NodeId, side: usize, child: NodeId) {
        if let Some(children) = self.nodes[parent.0].children.as_mut() {
            children[side] = child;
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check every structural invariant of the tree.
    ///
    /// Covers parent/child link consistency, internal weights being the sum
    /// of their children, sibling orders being adjacent (left = right - 1),
    /// unique orders, weights non-decreasing in order, the leaf index, and
    /// the NYT being a zero-weight symbol-less leaf.
    pub fn verify(&self) -> FgkResult<()> {
        let broken = |msg: String| Err(FgkError::BrokenInvariant(msg));

        if self.nodes[Self::ROOT.0].parent.is_some() {
            return broken("root has a parent".into());
        }

        let mut reachable = 0usize;
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            reachable += 1;
            let node = &self.nodes[id.0];
            if let Some([left, right]) = node.children {
                for child in [left, right] {
                    if self.nodes.get(child.0).and_then(|c| c.parent) != Some(id) {
                        return broken(format!("node {} does not point back to {}", child.0, id.0));
                    }
                }
                let (l, r) = (&self.nodes[left.0], &self.nodes[right.0]);
                if node.weight != l.weight + r.weight {
                    return broken(format!(
                        "node {} weight {} != {} + {}",
                        id.0, node.weight, l.weight, r.weight
                    ));
                }
                if l.order + 1 != r.order {
                    return broken(format!(
                        "siblings {} and {} have non-adjacent orders {} and {}",
                        left.0, right.0, l.order, r.order
                    ));
                }
                if node.symbol.is_some() {
                    return broken(format!("internal node {} carries a symbol", id.0));
                }
                stack.push(left);
                stack.push(right);
            }
        }
        if reachable != self.nodes.len() {
            return broken(format!(
                "{} nodes reachable from the root, {} allocated",
                reachable,
                self.nodes.len()
            ));
        }

        let mut by_order: Vec<&Node> = self.nodes.iter().collect();
        by_order.sort_by_key(|n| n.order);
        for pair in by_order.windows(2) {
            if pair[0].order == pair[1].order {
                return broken(format!("duplicate order {}", pair[0].order));
            }
            if pair[0].weight > pair[1].weight {
                return broken(format!(
                    "order {} has weight {} above order {} with weight {}",
                    pair[0].order, pair[0].weight, pair[1].order, pair[1].weight
                ));
            }
        }

        let mut indexed = 0usize;
        for (symbol, slot) in self.leaves.iter().enumerate() {
            if let Some(id) = *slot {
                indexed += 1;
                match self.nodes.get(id.0) {
                    Some(n) if n.is_leaf() && n.symbol == Some(symbol as u8) => {}
                    _ => return broken(format!("leaf index for {symbol:#04x} is stale")),
                }
            }
        }
        if indexed != self.symbol_count {
            return broken(format!(
                "leaf index holds {} symbols, counter says {}",
                indexed, self.symbol_count
            ));
        }

        match self.nyt {
            Some(nyt) => {
                let n = &self.nodes[nyt.0];
                if !n.is_leaf() || n.weight != 0 || n.symbol.is_some() {
                    return broken(format!("nyt {} is not an empty leaf", nyt.0));
                }
            }
            None if self.symbol_count < ALPHABET_SIZE => {
                return broken("nyt missing before alphabet exhaustion".into());
            }
            None => {}
        }
        Ok(())
    }
}

impl fmt::Display for AdaptiveTree {
    /// Indented pre-order dump, left subtree before right.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.0];
            write!(
                f,
                "{:indent$}order={} weight={} ",
                "",
                node.order,
                node.weight,
                indent = depth * 2
            )?;
            match (node.children, node.symbol) {
                (Some([left, right]), _) => {
                    writeln!(f, "internal")?;
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
                (None, Some(sym)) => writeln!(f, "leaf symbol={sym:#04x}")?,
                (None, None) if self.nyt == Some(id) => writeln!(f, "nyt")?,
                (None, None) => writeln!(f, "empty")?,
            }
        }
        Ok(())
    }
}
