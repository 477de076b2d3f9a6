use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub nodes: Vec<String>,
    pub severity: Severity,
}

/// Import graph wrapper over `petgraph`, built from the intelligence
/// sidecar's `import_graph` (§4.L).
struct ImportGraph {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    fn build(import_graph: &BTreeMap<String, Vec<String>>) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();
        for node in import_graph.keys() {
            let idx = graph.add_node(node.clone());
            index_of.insert(node.clone(), idx);
        }
        for (source, targets) in import_graph {
            let source_idx = index_of[source];
            for target in targets {
                let target_idx = *index_of
                    .entry(target.clone())
                    .or_insert_with(|| graph.add_node(target.clone()));
                graph.add_edge(source_idx, target_idx, ());
            }
        }
        Self { graph, index_of }
    }
}

/// Detect every elementary cycle in the import graph, optionally restricted
/// to paths starting with `scope`, sorted ascending by length (§4.L).
pub fn detect_cycles(import_graph: &BTreeMap<String, Vec<String>>, scope: Option<&str>) -> Vec<Cycle> {
    let filtered = match scope {
        Some(prefix) => restrict_to_scope(import_graph, prefix),
        None => import_graph.clone(),
    };

    let wrapper = ImportGraph::build(&filtered);
    let elementary = johnson_elementary_cycles(&wrapper.graph);

    let mut cycles: Vec<Cycle> = elementary
        .into_iter()
        .map(|indices| {
            let nodes: Vec<String> = indices.iter().map(|&idx| wrapper.graph[idx].clone()).collect();
            let severity = severity_for_length(nodes.len());
            Cycle { nodes, severity }
        })
        .collect();

    cycles.sort_by_key(|c| c.nodes.len());
    cycles
}

fn restrict_to_scope(import_graph: &BTreeMap<String, Vec<String>>, prefix: &str) -> BTreeMap<String, Vec<String>> {
    import_graph
        .iter()
        .filter(|(path, _)| path.starts_with(prefix))
        .map(|(path, targets)| {
            let scoped_targets: Vec<String> = targets.iter().filter(|t| t.starts_with(prefix)).cloned().collect();
            (path.clone(), scoped_targets)
        })
        .collect()
}

fn severity_for_length(len: usize) -> Severity {
    match len {
        2 => Severity::High,
        n if n <= 3 => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Johnson's elementary-cycle enumeration (Johnson, 1975), restricted each
/// iteration to the strongly connected subgraph reachable from the current
/// start vertex among the not-yet-processed vertices.
fn johnson_elementary_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<NodeIndex>> {
    let mut results = Vec::new();
    let all_nodes: Vec<NodeIndex> = graph.node_indices().collect();

    for (position, &start) in all_nodes.iter().enumerate() {
        let remaining: HashSet<NodeIndex> = all_nodes[position..].iter().copied().collect();
        let Some(scc) = least_scc_containing(graph, &remaining, start) else {
            continue;
        };
        if scc.len() < 2 && !graph.contains_edge(start, start) {
            continue;
        }

        let mut adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for &node in &scc {
            let neighbors: Vec<NodeIndex> = graph.neighbors(node).filter(|target| scc.contains(target)).collect();
            adjacency.insert(node, neighbors);
        }

        let mut blocked: HashSet<NodeIndex> = HashSet::new();
        let mut block_map: HashMap<NodeIndex, HashSet<NodeIndex>> = HashMap::new();
        let mut stack: Vec<NodeIndex> = vec![start];
        blocked.insert(start);

        circuit(start, start, &adjacency, &mut blocked, &mut block_map, &mut stack, &mut results);
    }

    results
}

fn least_scc_containing(
    graph: &DiGraph<String, ()>,
    remaining: &HashSet<NodeIndex>,
    target: NodeIndex,
) -> Option<HashSet<NodeIndex>> {
    let mut subgraph: DiGraph<NodeIndex, ()> = DiGraph::new();
    let mut original_to_sub: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    for &node in remaining {
        original_to_sub.insert(node, subgraph.add_node(node));
    }
    for &node in remaining {
        for neighbor in graph.neighbors(node) {
            if remaining.contains(&neighbor) {
                subgraph.add_edge(original_to_sub[&node], original_to_sub[&neighbor], ());
            }
        }
    }

    let sub_target = original_to_sub[&target];
    for component in tarjan_scc(&subgraph) {
        if component.contains(&sub_target) {
            return Some(
                component
                    .into_iter()
                    .map(|sub_idx| *subgraph.node_references().find(|(i, _)| *i == sub_idx).unwrap().1)
                    .collect(),
            );
        }
    }
    None
}

fn circuit(
    v: NodeIndex,
    start: NodeIndex,
    adjacency: &HashMap<NodeIndex, Vec<NodeIndex>>,
    blocked: &mut HashSet<NodeIndex>,
    block_map: &mut HashMap<NodeIndex, HashSet<NodeIndex>>,
    stack: &mut Vec<NodeIndex>,
    results: &mut Vec<Vec<NodeIndex>>,
) -> bool {
    let mut found_cycle = false;
    let neighbors = adjacency.get(&v).cloned().unwrap_or_default();

    for w in &neighbors {
        if *w == start {
            results.push(stack.clone());
            found_cycle = true;
        } else if !blocked.contains(w) {
            stack.push(*w);
            blocked.insert(*w);
            if circuit(*w, start, adjacency, blocked, block_map, stack, results) {
                found_cycle = true;
            }
            blocked.remove(w);
            stack.pop();
        }
    }

    if found_cycle {
        unblock(v, blocked, block_map);
    } else {
        for w in &neighbors {
            block_map.entry(*w).or_default().insert(v);
        }
    }
    found_cycle
}

fn unblock(v: NodeIndex, blocked: &mut HashSet<NodeIndex>, block_map: &mut HashMap<NodeIndex, HashSet<NodeIndex>>) {
    blocked.remove(&v);
    if let Some(dependents) = block_map.remove(&v) {
        for w in dependents {
            if blocked.contains(&w) {
                unblock(w, blocked, block_map);
            }
        }
    }
}
