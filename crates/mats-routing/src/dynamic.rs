//! Congestion-aware routing view.
//!
//! The dynamic router keeps a per-edge congestion multiplier map and, when
//! asked to consider traffic, routes against the graph with each edge weight
//! scaled by its factor.  The scaling happens in the A* weight closure — no
//! graph copy is made.  Traffic-weighted queries bypass the route cache,
//! which only holds answers valid for the unscaled graph.

use rustc_hash::FxHashMap;

use mats_core::{NodeId, Point, config::RoutingAlgorithm};

use crate::astar::{a_star_nodes, node_path_to_waypoints, AStarRouter, RouterStats};
use crate::dijkstra::DijkstraRouter;
use crate::graph::RoadGraph;

/// Undirected edge key: endpoints in sorted order.
#[inline]
fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Router facade combining the configured base algorithm with dynamic
/// congestion weights.
pub struct DynamicRouter {
    algorithm: RoutingAlgorithm,
    astar: AStarRouter,
    dijkstra: DijkstraRouter,
    /// Per-edge congestion factor ≥ 1.0 (1.0 = free flow).
    traffic_weights: FxHashMap<(NodeId, NodeId), f32>,
    traffic_paths_calculated: u64,
}

impl DynamicRouter {
    pub fn new(algorithm: RoutingAlgorithm) -> Self {
        Self {
            algorithm,
            astar: AStarRouter::new(),
            dijkstra: DijkstraRouter::new(),
            traffic_weights: FxHashMap::default(),
            traffic_paths_calculated: 0,
        }
    }

    /// Set the congestion factor of edge `{a, b}`.  Factors below 1.0 are
    /// clamped up — congestion never makes a road faster.
    pub fn update_traffic_weight(&mut self, a: NodeId, b: NodeId, congestion_factor: f32) {
        self.traffic_weights.insert(edge_key(a, b), congestion_factor.max(1.0));
    }

    /// Forget all congestion factors.
    pub fn clear_traffic_weights(&mut self) {
        self.traffic_weights.clear();
    }

    #[inline]
    pub fn has_traffic_weights(&self) -> bool {
        !self.traffic_weights.is_empty()
    }

    /// Route between two positions, optionally against the congestion-scaled
    /// weight view.  Same path contract as the base routers.
    pub fn find_path(
        &mut self,
        graph: &RoadGraph,
        start_pos: Point,
        end_pos: Point,
        consider_traffic: bool,
    ) -> Option<Vec<Point>> {
        if consider_traffic && !self.traffic_weights.is_empty() {
            return self.find_weighted(graph, start_pos, end_pos);
        }
        match self.algorithm {
            RoutingAlgorithm::AStar => self.astar.find_path(graph, start_pos, end_pos),
            RoutingAlgorithm::Dijkstra => self.dijkstra.find_path(graph, start_pos, end_pos),
        }
    }

    fn find_weighted(
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

        let weights = &self.traffic_weights;
        let path = a_star_nodes(graph, start, end, |a, b, base| {
            base * weights.get(&edge_key(a, b)).copied().unwrap_or(1.0)
        })?;
        self.traffic_paths_calculated += 1;
        Some(node_path_to_waypoints(graph, &path, start_pos, end_pos))
    }

    /// Drop cached routes after a topology change (blockage added/expired).
    pub fn invalidate_cache(&mut self) {
        self.astar.invalidate_cache();
    }

    /// Combined counters across the base router and traffic-weighted queries.
    pub fn stats(&self) -> RouterStats {
        let mut stats = match self.algorithm {
            RoutingAlgorithm::AStar => self.astar.stats(),
            RoutingAlgorithm::Dijkstra => self.dijkstra.stats(),
        };
        stats.paths_calculated += self.traffic_paths_calculated;
        stats
    }
}
