//! Dependency graph over a set of MODs (§4.8). Only `Required` edges
//! participate in topological ordering and cycle detection; other kinds are
//! carried for the validator but otherwise inert here.

use std::collections::{HashMap, HashSet};

use fmm_model::{DependencyKind, DependencySpec, ModName};

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// Every node present in the graph, even ones with no edges.
    nodes: HashSet<ModName>,
    /// `name -> declared dependencies`, in declaration order.
    edges: HashMap<ModName, Vec<DependencySpec>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: ModName) {
        self.nodes.insert(name.clone());
        self.edges.entry(name).or_default();
    }

    /// Declares that `from` depends on `spec.target` per `spec.kind`. Adds
    /// both endpoints as nodes if not already present.
    pub fn add_edge(&mut self, from: ModName, spec: DependencySpec) {
        self.add_node(from.clone());
        self.add_node(spec.target.clone());
        self.edges.entry(from).or_default().push(spec);
    }

    pub fn contains(&self, name: &ModName) -> bool {
        self.nodes.contains(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ModName> {
        self.nodes.iter()
    }

    pub fn edges_from(&self, name: &ModName) -> &[DependencySpec] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn required_targets(&self, name: &ModName) -> impl Iterator<Item = &ModName> {
        self.edges_from(name)
            .iter()
            .filter(|spec| spec.kind == DependencyKind::Required)
            .map(|spec| &spec.target)
    }

    /// Topological order over `Required` edges only. `Err` carries the first
    /// cycle found, node-repeated at the end (eg. `[A, B, A]`), if the
    /// `Required` subgraph isn't a DAG.
    pub fn topological_order(&self) -> Result<Vec<ModName>, Vec<ModName>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&ModName, Mark> = HashMap::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&ModName> = Vec::new();

        fn visit<'a>(
            graph: &'a DependencyGraph,
            node: &'a ModName,
            marks: &mut HashMap<&'a ModName, Mark>,
            stack: &mut Vec<&'a ModName>,
            order: &mut Vec<ModName>,
        ) -> Result<(), Vec<ModName>> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                    let mut cycle: Vec<ModName> = stack[start..].iter().map(|n| (*n).clone()).collect();
                    cycle.push(node.clone());
                    return Err(cycle);
                }
                None => {}
            }

            marks.insert(node, Mark::Visiting);
            stack.push(node);

            for target in graph.required_targets(node) {
                if graph.contains(target) {
                    visit(graph, target, marks, stack, order)?;
                }
            }

            stack.pop();
            marks.insert(node, Mark::Done);
            order.push(node.clone());
            Ok(())
        }

        let mut sorted_nodes: Vec<&ModName> = self.nodes.iter().collect();
        sorted_nodes.sort();
        for node in sorted_nodes {
            if !marks.contains_key(node) {
                visit(self, node, &mut marks, &mut stack, &mut order)?;
            }
        }

        Ok(order)
    }

    /// One finding per strongly-connected component of the `Required`-edge
    /// subgraph (§4.8), plus one per self-loop. An SCC of size 1 with no
    /// self-loop isn't a cycle at all and is skipped. Reported as the SCC's
    /// node list, sorted, with the first node repeated at the end (eg. a
    /// two-node SCC `{a, b}` is reported as `[a, b, a]`); a self-loop is
    /// reported as `[A, A]`.
    pub fn find_cycles(&self) -> Vec<Vec<ModName>> {
        let mut cycles = Vec::new();

        let mut sorted_nodes: Vec<&ModName> = self.nodes.iter().collect();
        sorted_nodes.sort();
        for node in sorted_nodes {
            if self.required_targets(node).any(|target| target == node) {
                cycles.push(vec![node.clone(), node.clone()]);
            }
        }

        let mut scc_cycles: Vec<Vec<ModName>> = self
            .strongly_connected_components()
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|mut scc| {
                scc.sort();
                let first = scc[0].clone();
                scc.push(first);
                scc
            })
            .collect();
        scc_cycles.sort();
        cycles.extend(scc_cycles);

        cycles
    }

    /// Tarjan's algorithm over the `Required`-edge subgraph.
    fn strongly_connected_components(&self) -> Vec<Vec<ModName>> {
        struct State<'a> {
            counter: usize,
            indices: HashMap<&'a ModName, usize>,
            low_links: HashMap<&'a ModName, usize>,
            on_stack: HashSet<&'a ModName>,
            stack: Vec<&'a ModName>,
            sccs: Vec<Vec<ModName>>,
        }

        fn strong_connect<'a>(graph: &'a DependencyGraph, node: &'a ModName, state: &mut State<'a>) {
            state.indices.insert(node, state.counter);
            state.low_links.insert(node, state.counter);
            state.counter += 1;
            state.stack.push(node);
            state.on_stack.insert(node);

            for target in graph.required_targets(node) {
                if !graph.contains(target) {
                    continue;
                }
                if !state.indices.contains_key(target) {
                    strong_connect(graph, target, state);
                    let target_low = state.low_links[target];
                    let node_low = state.low_links[node];
                    state.low_links.insert(node, node_low.min(target_low));
                } else if state.on_stack.contains(target) {
                    let target_index = state.indices[target];
                    let node_low = state.low_links[node];
                    state.low_links.insert(node, node_low.min(target_index));
                }
            }

            if state.low_links[node] == state.indices[node] {
                let mut component = Vec::new();
                loop {
                    let member = state.stack.pop().expect("node's own SCC root is still on the stack");
                    state.on_stack.remove(member);
                    component.push(member.clone());
                    if member == node {
                        break;
                    }
                }
                state.sccs.push(component);
            }
        }

        let mut state = State {
            counter: 0,
            indices: HashMap::new(),
            low_links: HashMap::new(),
            on_stack: HashSet::new(),
            stack: Vec::new(),
            sccs: Vec::new(),
        };

        let mut sorted_nodes: Vec<&ModName> = self.nodes.iter().collect();
        sorted_nodes.sort();
        for node in sorted_nodes {
            if !state.indices.contains_key(node) {
                strong_connect(self, node, &mut state);
            }
        }

        state.sccs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmm_model::VersionConstraint;

    fn name(s: &str) -> ModName {
        s.parse().unwrap()
    }

    fn required(target: &str) -> DependencySpec {
        DependencySpec::new(name(target), DependencyKind::Required, None)
    }

    #[test]
    fn topological_order_respects_required_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(name("b"), required("a"));
        graph.add_edge(name("c"), required("b"));

        let order = graph.topological_order().unwrap();
        let pos = |n: &str| order.iter().position(|x| x == &name(n)).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn optional_edges_do_not_affect_ordering_or_cycles() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(name("a"), DependencySpec::new(name("b"), DependencyKind::Optional, None));
        graph.add_edge(name("b"), DependencySpec::new(name("a"), DependencyKind::Optional, None));

        assert!(graph.topological_order().is_ok());
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn detects_two_node_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(name("a"), required("b"));
        graph.add_edge(name("b"), required("a"));

        assert!(graph.topological_order().is_err());
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn an_scc_with_multiple_elementary_cycles_produces_one_finding() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(name("a"), required("b"));
        graph.add_edge(name("b"), required("c"));
        graph.add_edge(name("c"), required("a"));
        graph.add_edge(name("b"), required("a"));

        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn detects_self_loop_as_length_one_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(name("a"), required("a"));

        let cycles = graph.find_cycles();
        assert_eq!(cycles, vec![vec![name("a"), name("a")]]);
    }

    #[test]
    fn version_constraint_on_edge_does_not_prevent_traversal() {
        let mut graph = DependencyGraph::new();
        let constraint = VersionConstraint::new(fmm_model::ConstraintOp::Ge, "1.0.0".parse().unwrap());
        graph.add_edge(name("b"), DependencySpec::new(name("a"), DependencyKind::Required, Some(constraint)));

        assert_eq!(graph.topological_order().unwrap(), vec![name("a"), name("b")]);
    }
}
