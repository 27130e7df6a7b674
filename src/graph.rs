//! Shortest-path search on the roadmap graph and index-sequence cleanup.

use std::collections::BinaryHeap;

use petgraph::graph::{NodeIndex, UnGraph};

/// Min-heap entry ordered by score.
#[derive(Copy, Clone, PartialEq)]
struct MinScored(f64, NodeIndex);

impl Eq for MinScored {}

impl Ord for MinScored {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // reversed so the BinaryHeap pops the smallest score first
        other
            .0
            .partial_cmp(&self.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| other.1.index().cmp(&self.1.index()))
    }
}

impl PartialOrd for MinScored {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source shortest paths with predecessor recording.
///
/// `weight` wraps the stored edge weights and may veto an edge by returning
/// `None`; this is how the path strategies modify the metric without
/// touching the graph.
pub fn shortest_path_predecessors<W>(
    graph: &UnGraph<(), f64>,
    start: NodeIndex,
    weight: W,
) -> Vec<Option<NodeIndex>>
where
    W: Fn(NodeIndex, NodeIndex) -> Option<f64>,
{
    let num = graph.node_count();
    let mut dist = vec![f64::INFINITY; num];
    let mut predecessors: Vec<Option<NodeIndex>> = vec![None; num];
    let mut visited = vec![false; num];

    let mut heap = BinaryHeap::new();
    dist[start.index()] = 0.;
    heap.push(MinScored(0., start));

    while let Some(MinScored(cur_dist, cur)) = heap.pop() {
        if visited[cur.index()] {
            continue;
        }
        visited[cur.index()] = true;

        for neighbour in graph.neighbors(cur) {
            if visited[neighbour.index()] {
                continue;
            }

            let Some(edge_weight) = weight(cur, neighbour) else {
                continue;
            };

            let new_dist = cur_dist + edge_weight;
            if new_dist < dist[neighbour.index()] {
                dist[neighbour.index()] = new_dist;
                predecessors[neighbour.index()] = Some(cur);
                heap.push(MinScored(new_dist, neighbour));
            }
        }
    }

    predecessors
}

/// Walk the predecessor map back from `goal` to `start`.
pub fn reconstruct_path(
    predecessors: &[Option<NodeIndex>],
    start: NodeIndex,
    goal: NodeIndex,
) -> Option<Vec<usize>> {
    let mut indices = vec![];
    let mut cur = goal;

    loop {
        indices.push(cur.index());
        if cur == start {
            break;
        }
        cur = predecessors[cur.index()]?;
    }

    indices.reverse();
    Some(indices)
}

/// Remove loops from a sequence of vertex indices: when an index reappears,
/// everything from its first occurrence up to the repetition is dropped.
pub fn remove_path_loops(indices: &mut Vec<usize>) {
    use std::collections::HashMap;

    let mut first_seen: HashMap<usize, usize> = HashMap::new();
    let mut pos = 0;

    while pos < indices.len() {
        let vert = indices[pos];
        if let Some(&seen_at) = first_seen.get(&vert) {
            indices.drain(seen_at..pos);
            pos = seen_at;
            first_seen.retain(|_, &mut idx| idx < pos);
        }
        first_seen.insert(vert, pos);
        pos += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn diamond() -> UnGraph<(), f64> {
        // 0 -1- 1 -1- 3, 0 -5- 2 -1- 3
        let mut graph = UnGraph::<(), f64>::default();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());
        let n3 = graph.add_node(());
        graph.add_edge(n0, n1, 1.);
        graph.add_edge(n1, n3, 1.);
        graph.add_edge(n0, n2, 5.);
        graph.add_edge(n2, n3, 1.);
        graph
    }

    fn stored_weight(graph: &UnGraph<(), f64>) -> impl Fn(NodeIndex, NodeIndex) -> Option<f64> + '_ {
        move |idx1, idx2| {
            graph
                .find_edge(idx1, idx2)
                .and_then(|edge| graph.edge_weight(edge))
                .copied()
        }
    }

    #[test]
    fn dijkstra_picks_the_short_branch() {
        let graph = diamond();
        let preds = shortest_path_predecessors(&graph, NodeIndex::new(0), stored_weight(&graph));
        let path = reconstruct_path(&preds, NodeIndex::new(0), NodeIndex::new(3)).unwrap();
        assert_eq!(path, vec![0, 1, 3]);
    }

    #[test]
    fn weight_function_can_redirect() {
        let graph = diamond();
        // penalise node 1 so the longer branch wins
        let preds = shortest_path_predecessors(&graph, NodeIndex::new(0), |idx1, idx2| {
            let base = stored_weight(&graph)(idx1, idx2)?;
            if idx1.index() == 1 || idx2.index() == 1 {
                Some(base * 100.)
            } else {
                Some(base)
            }
        });
        let path = reconstruct_path(&preds, NodeIndex::new(0), NodeIndex::new(3)).unwrap();
        assert_eq!(path, vec![0, 2, 3]);
    }

    #[test]
    fn unreachable_vertex() {
        let mut graph = diamond();
        let lone = graph.add_node(());
        let preds = shortest_path_predecessors(&graph, NodeIndex::new(0), stored_weight(&graph));
        assert!(reconstruct_path(&preds, NodeIndex::new(0), lone).is_none());
    }

    #[test]
    fn distances_match_weights() {
        let graph = diamond();
        let preds = shortest_path_predecessors(&graph, NodeIndex::new(0), stored_weight(&graph));
        // walk the path and re-add the weights
        let path = reconstruct_path(&preds, NodeIndex::new(0), NodeIndex::new(3)).unwrap();
        let mut total = 0.;
        for pair in path.windows(2) {
            let edge = graph
                .find_edge(NodeIndex::new(pair[0]), NodeIndex::new(pair[1]))
                .unwrap();
            total += graph.edge_weight(edge).unwrap();
        }
        assert_relative_eq!(total, 2.0);
    }

    #[test]
    fn loop_removal() {
        let mut indices = vec![0, 1, 2, 3, 1, 4];
        remove_path_loops(&mut indices);
        assert_eq!(indices, vec![0, 1, 4]);

        let mut indices = vec![5, 5, 5];
        remove_path_loops(&mut indices);
        assert_eq!(indices, vec![5]);
    }

    #[test]
    fn loop_removal_is_idempotent() {
        let cases = vec![
            vec![0, 1, 2, 3, 1, 4, 2, 5],
            vec![7, 7, 7, 7],
            vec![1, 2, 3],
            vec![],
        ];

        for case in cases {
            let mut once = case.clone();
            remove_path_loops(&mut once);
            let mut twice = once.clone();
            remove_path_loops(&mut twice);
            assert_eq!(once, twice, "input {:?}", case);
        }
    }
}
