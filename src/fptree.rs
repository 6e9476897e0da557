use std::collections::{BTreeMap, HashMap};

const ROOT: usize = 0;

struct FPNode {
    item: u32,
    count: u64,
    parent: usize,
    children: HashMap<u32, usize>,
}

impl FPNode {
    fn new(item: u32, parent: usize) -> FPNode {
        FPNode {
            item,
            count: 0,
            parent,
            children: HashMap::new(),
        }
    }
}

// Count-annotated prefix tree over transactions of item ids. Transactions
// must be inserted with their ids sorted ascending (decreasing global
// frequency) so that common prefixes share nodes.
pub struct FPTree {
    nodes: Vec<FPNode>,
    // Nodes holding each item, in creation order.
    item_lists: BTreeMap<u32, Vec<usize>>,
    item_count: BTreeMap<u32, u64>,
    num_transactions: u64,
}

impl FPTree {
    pub fn new() -> FPTree {
        FPTree {
            nodes: vec![FPNode::new(u32::MAX, ROOT)],
            item_lists: BTreeMap::new(),
            item_count: BTreeMap::new(),
            num_transactions: 0,
        }
    }

    pub fn insert(&mut self, transaction: &[u32], count: u64) {
        if transaction.is_empty() || count == 0 {
            return;
        }
        self.num_transactions += count;
        let mut node = ROOT;
        for &item in transaction {
            let child = match self.nodes[node].children.get(&item) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(FPNode::new(item, node));
                    self.nodes[node].children.insert(item, child);
                    self.item_lists.entry(item).or_insert_with(Vec::new).push(child);
                    child
                }
            };
            self.nodes[child].count += count;
            *self.item_count.entry(item).or_insert(0) += count;
            node = child;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_count.is_empty()
    }

    pub fn num_transactions(&self) -> u64 {
        self.num_transactions
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn item_count(&self, item: u32) -> u64 {
        self.item_count.get(&item).cloned().unwrap_or(0)
    }

    /// Items in the tree, most frequent (lowest id) first.
    pub fn items(&self) -> Vec<u32> {
        self.item_count.keys().cloned().collect()
    }

    // Path from the root down to `node`'s parent, root side first.
    fn prefix_path(&self, node: usize) -> Vec<u32> {
        let mut path = vec![];
        let mut parent = self.nodes[node].parent;
        while parent != ROOT {
            path.push(self.nodes[parent].item);
            parent = self.nodes[parent].parent;
        }
        path.reverse();
        path
    }

    /// The conditional pattern base of `item`: every prefix path leading to
    /// a node of `item`, weighted by that node's count.
    pub fn conditional_pattern_base(&self, item: u32) -> Vec<(Vec<u32>, u64)> {
        match self.item_lists.get(&item) {
            Some(nodes) => nodes
                .iter()
                .map(|&node| (self.prefix_path(node), self.nodes[node].count))
                .collect(),
            None => vec![],
        }
    }

    /// Builds the tree of `item`'s conditional pattern base, keeping only
    /// items that reach `min_count` within it.
    pub fn conditional_tree(&self, item: u32, min_count: u64) -> FPTree {
        let base = self.conditional_pattern_base(item);
        let mut counts: HashMap<u32, u64> = HashMap::new();
        for &(ref path, count) in base.iter() {
            for &i in path {
                *counts.entry(i).or_insert(0) += count;
            }
        }
        let mut tree = FPTree::new();
        for (path, count) in base {
            let filtered: Vec<u32> = path
                .into_iter()
                .filter(|i| counts[i] >= min_count)
                .collect();
            tree.insert(&filtered, count);
        }
        tree
    }
}
