//! Small shared utilities: union-find, used by node-merge and s-component detection.

use std::collections::HashMap;
use std::hash::Hash;

/// Union-find (disjoint-set) over an arbitrary key type, with path compression and
/// union-by-rank.
#[derive(Debug, Default)]
pub struct UnionFind<K: Eq + Hash + Clone> {
    index: HashMap<K, usize>,
    keys: Vec<K>,
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl<K: Eq + Hash + Clone> UnionFind<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            keys: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
        }
    }

    fn ensure(&mut self, key: &K) -> usize {
        if let Some(&i) = self.index.get(key) {
            return i;
        }
        let i = self.keys.len();
        self.keys.push(key.clone());
        self.parent.push(i);
        self.rank.push(0);
        self.index.insert(key.clone(), i);
        i
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            self.parent[i] = self.find(self.parent[i]);
        }
        self.parent[i]
    }

    pub fn union(&mut self, a: &K, b: &K) {
        let ai = self.ensure(a);
        let bi = self.ensure(b);
        let ra = self.find(ai);
        let rb = self.find(bi);
        if ra == rb {
            return;
        }
        if self.rank[ra] < self.rank[rb] {
            self.parent[ra] = rb;
        } else if self.rank[ra] > self.rank[rb] {
            self.parent[rb] = ra;
        } else {
            self.parent[rb] = ra;
            self.rank[ra] += 1;
        }
    }

    /// Make sure `key` is registered even if it never unions with anything, so it
    /// shows up as a singleton component.
    pub fn add(&mut self, key: &K) {
        self.ensure(key);
    }

    /// Partition all registered keys into their connected components.
    pub fn components(mut self) -> Vec<Vec<K>> {
        let mut groups: HashMap<usize, Vec<K>> = HashMap::new();
        for i in 0..self.keys.len() {
            let root = self.find(i);
            groups.entry(root).or_default().push(self.keys[i].clone());
        }
        groups.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_transitively() {
        let mut uf: UnionFind<i32> = UnionFind::new();
        uf.union(&1, &2);
        uf.union(&2, &3);
        uf.add(&4);
        let mut comps = uf.components();
        comps.sort_by_key(|c| c.len());
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0], vec![4]);
        let mut big = comps[1].clone();
        big.sort();
        assert_eq!(big, vec![1, 2, 3]);
    }
}
