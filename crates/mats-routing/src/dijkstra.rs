//! Dijkstra routing — the heuristic-free alternative to [`AStarRouter`].
//!
//! Selected by `algorithms.routing = "DIJKSTRA"`.  Same path contract as the
//! A* router; no route cache (the configuration that picks Dijkstra is the
//! one benchmarking raw search behavior).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use mats_core::{NodeId, Point};

use crate::astar::{node_path_to_waypoints, RouterStats};
use crate::graph::RoadGraph;

/// Min-heap entry ordered by accumulated cost, node id as tie-break.
#[derive(Copy, Clone, PartialEq)]
struct QueueEntry {
    dist: f32,
    node: NodeId,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist.total_cmp(&other.dist).then(self.node.cmp(&other.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub struct DijkstraRouter {
    paths_calculated: u64,
}

impl DijkstraRouter {
    pub fn new() -> Self {
        Self { paths_calculated: 0 }
    }

    /// Route between two positions.  See the crate docs for the path
    /// contract.
    pub fn find_path(
        &mut self,
        graph: &RoadGraph,
        start_pos: Point,
        end_pos: Point,
    ) -> Option<Vec<Point>> {
        let start = graph.nearest_node(start_pos)?;
        let end = graph.nearest_node(end_pos)?;

        if start == end {
            return Some(vec![start_pos, end_pos]);
        }

        let path = dijkstra_nodes(graph, start, end)?;
        self.paths_calculated += 1;
        Some(node_path_to_waypoints(graph, &path, start_pos, end_pos))
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats { paths_calculated: self.paths_calculated, ..RouterStats::default() }
    }
}

impl Default for DijkstraRouter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn dijkstra_nodes(graph: &RoadGraph, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
    let mut heap: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
    let mut dist: FxHashMap<NodeId, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();

    dist.insert(start, 0.0);
    heap.push(Reverse(QueueEntry { dist: 0.0, node: start }));

    while let Some(Reverse(QueueEntry { dist: d, node })) = heap.pop() {
        if !visited.insert(node) {
            continue;
        }
        if node == goal {
            let mut path = vec![node];
            let mut current = node;
            while let Some(&prev) = came_from.get(&current) {
                current = prev;
                path.push(current);
            }
            path.reverse();
            return Some(path);
        }

        for (neighbor, weight) in graph.neighbors(node) {
            if visited.contains(&neighbor) {
                continue;
            }
            let next = d + weight;
            if dist.get(&neighbor).is_none_or(|&known| next < known) {
                dist.insert(neighbor, next);
                came_from.insert(neighbor, node);
                heap.push(Reverse(QueueEntry { dist: next, node: neighbor }));
            }
        }
    }

    None
}
