//! Module dependency graph: Tarjan SCC over value edges (spec §4.5 "Cycle
//! detection") plus a topological compile order (spec §4.5 "Topological
//! order") — see [`ModuleGraph::topo_order`] for the edge-direction note.

use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Value,
    TypeOnly,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    /// Insertion order of nodes, preserved for deterministic, insertion-
    /// stable traversal (spec §4.5 "within an SCC, order is insertion-
    /// stable").
    order: Vec<PathBuf>,
    edges: HashMap<PathBuf, Vec<(PathBuf, EdgeKind)>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        ModuleGraph::default()
    }

    pub fn add_node(&mut self, path: PathBuf) {
        if !self.order.contains(&path) {
            self.order.push(path.clone());
            self.edges.entry(path).or_default();
        }
    }

    pub fn add_edge(&mut self, from: PathBuf, to: PathBuf, kind: EdgeKind) {
        self.add_node(from.clone());
        self.add_node(to.clone());
        self.edges.get_mut(&from).unwrap().push((to, kind));
    }

    pub fn nodes(&self) -> &[PathBuf] {
        &self.order
    }

    fn value_neighbors(&self, node: &PathBuf) -> Vec<&PathBuf> {
        self.edges
            .get(node)
            .into_iter()
            .flatten()
            .filter(|(_, kind)| *kind == EdgeKind::Value)
            .map(|(to, _)| to)
            .collect()
    }

    fn all_neighbors(&self, node: &PathBuf) -> Vec<&PathBuf> {
        self.edges.get(node).into_iter().flatten().map(|(to, _)| to).collect()
    }

    /// Self-edges count as a one-node cycle (spec §4.5 "Any SCC of size ≥ 2
    /// (or a self-edge) is a cycle").
    pub fn sccs(&self) -> Vec<Vec<PathBuf>> {
        let mut index = 0usize;
        let mut indices: HashMap<PathBuf, usize> = HashMap::new();
        let mut lowlink: HashMap<PathBuf, usize> = HashMap::new();
        let mut on_stack: HashMap<PathBuf, bool> = HashMap::new();
        let mut stack: Vec<PathBuf> = Vec::new();
        let mut result: Vec<Vec<PathBuf>> = Vec::new();

        for start in &self.order {
            if indices.contains_key(start) {
                continue;
            }
            self.strongconnect(start, &mut index, &mut indices, &mut lowlink, &mut on_stack, &mut stack, &mut result);
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn strongconnect(
        &self,
        v: &PathBuf,
        index: &mut usize,
        indices: &mut HashMap<PathBuf, usize>,
        lowlink: &mut HashMap<PathBuf, usize>,
        on_stack: &mut HashMap<PathBuf, bool>,
        stack: &mut Vec<PathBuf>,
        result: &mut Vec<Vec<PathBuf>>,
    ) {
        indices.insert(v.clone(), *index);
        lowlink.insert(v.clone(), *index);
        *index += 1;
        stack.push(v.clone());
        on_stack.insert(v.clone(), true);

        // A self-edge (w == v) falls through to the on_stack branch below,
        // which is harmless: v's lowlink can't go lower than its own index.
        let neighbors: Vec<PathBuf> = self.value_neighbors(v).into_iter().cloned().collect();
        for w in &neighbors {
            if !indices.contains_key(w) {
                self.strongconnect(w, index, indices, lowlink, on_stack, stack, result);
                let wl = lowlink[w];
                let vl = lowlink[v];
                lowlink.insert(v.clone(), vl.min(wl));
            } else if *on_stack.get(w).unwrap_or(&false) {
                let wi = indices[w];
                let vl = lowlink[v];
                lowlink.insert(v.clone(), vl.min(wi));
            }
        }

        if lowlink[v] == indices[v] {
            let mut component = Vec::new();
            loop {
                let w = stack.pop().unwrap();
                on_stack.insert(w.clone(), false);
                let is_v = &w == v;
                component.push(w);
                if is_v {
                    break;
                }
            }
            // Restore insertion order within the component for determinism.
            component.sort_by_key(|p| self.order.iter().position(|q| q == p).unwrap_or(usize::MAX));
            let has_self_edge = component.len() == 1 && self.value_neighbors(&component[0]).iter().any(|n| **n == component[0]);
            if component.len() > 1 || has_self_edge {
                result.push(component);
            }
        }
    }

    /// A post-order DFS over all edges (value and type-only — a type-only
    /// dependency still needs its declarations resolved first), visiting
    /// nodes in insertion order so independent components come out
    /// deterministic and stable.
    ///
    /// Edges here point from an importer to what it imports, the opposite
    /// direction spec §4.5's "reverse post-order over the condensed DAG"
    /// assumes; with this edge direction a plain post-order already finishes
    /// every dependency before the module that depends on it, which is the
    /// same compile order the spec's phrasing describes for its own edge
    /// convention.
    pub fn topo_order(&self) -> Vec<PathBuf> {
        let mut visited: HashMap<PathBuf, bool> = HashMap::new();
        let mut post_order = Vec::new();
        for start in &self.order {
            if !visited.contains_key(start) {
                self.dfs_post_order(start, &mut visited, &mut post_order);
            }
        }
        post_order
    }

    fn dfs_post_order(&self, node: &PathBuf, visited: &mut HashMap<PathBuf, bool>, post_order: &mut Vec<PathBuf>) {
        visited.insert(node.clone(), true);
        let neighbors: Vec<PathBuf> = self.all_neighbors(node).into_iter().cloned().collect();
        for n in neighbors {
            if !visited.contains_key(&n) {
                self.dfs_post_order(&n, visited, post_order);
            }
        }
        post_order.push(node.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn acyclic_graph_has_no_sccs_and_orders_dependencies_first() {
        let mut g = ModuleGraph::new();
        g.add_edge(p("a"), p("b"), EdgeKind::Value);
        g.add_edge(p("b"), p("c"), EdgeKind::Value);
        assert!(g.sccs().is_empty());
        let order = g.topo_order();
        let pos_a = order.iter().position(|x| x == &p("a")).unwrap();
        let pos_b = order.iter().position(|x| x == &p("b")).unwrap();
        let pos_c = order.iter().position(|x| x == &p("c")).unwrap();
        assert!(pos_c < pos_b);
        assert!(pos_b < pos_a);
    }

    #[test]
    fn value_cycle_is_detected() {
        let mut g = ModuleGraph::new();
        g.add_edge(p("a"), p("b"), EdgeKind::Value);
        g.add_edge(p("b"), p("a"), EdgeKind::Value);
        let sccs = g.sccs();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 2);
    }

    #[test]
    fn type_only_cycle_is_silent() {
        let mut g = ModuleGraph::new();
        g.add_edge(p("a"), p("b"), EdgeKind::TypeOnly);
        g.add_edge(p("b"), p("a"), EdgeKind::TypeOnly);
        assert!(g.sccs().is_empty());
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let mut g = ModuleGraph::new();
        g.add_edge(p("a"), p("a"), EdgeKind::Value);
        let sccs = g.sccs();
        assert_eq!(sccs, vec![vec![p("a")]]);
    }
}
