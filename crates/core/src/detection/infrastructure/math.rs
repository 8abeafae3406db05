//! Union-find used to cluster raw cascade hits.

/// Find root of element `i` with path halving.
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Label every element with its cluster index.
///
/// Cluster indices are assigned in order of first appearance, so the
/// labelling depends only on input order.
pub fn cluster_labels(parent: &mut [usize]) -> (Vec<usize>, usize) {
    let n = parent.len();
    let mut root_label = vec![usize::MAX; n];
    let mut labels = Vec::with_capacity(n);
    let mut count = 0;
    for i in 0..n {
        let root = find(parent, i);
        if root_label[root] == usize::MAX {
            root_label[root] = count;
            count += 1;
        }
        labels.push(root_label[root]);
    }
    (labels, count)
}
