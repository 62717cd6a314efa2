//! Road network representation.
//!
//! # Data layout
//!
//! The graph is undirected and **mutable at runtime**: scenarios remove and
//! restore edges while the simulation runs, so adjacency lives in per-node
//! hash maps rather than a frozen CSR block.  An edge `{a, b}` is stored in
//! both endpoints' maps with the same weight.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(x, y)` to the nearest `NodeId`.  Used to
//! snap vehicle origins/destinations and incident corridors to road nodes.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use mats_core::{NodeId, Point};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[x, y]` point with the
/// associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Blockage ──────────────────────────────────────────────────────────────────

/// A temporarily removed edge, remembered so it can be restored with its
/// original weight once the blockage expires.
#[derive(Clone, Debug)]
struct Blockage {
    a: NodeId,
    b: NodeId,
    weight: f32,
    /// Absolute simulated time at which the edge comes back.
    expiry: f64,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Undirected weighted road graph with node snapping and timed blockages.
pub struct RoadGraph {
    node_pos: Vec<Point>,
    /// Per-node adjacency: neighbor id → edge weight.
    adjacency: Vec<FxHashMap<NodeId, f32>>,
    spatial_idx: RTree<NodeEntry>,
    blockages: Vec<Blockage>,
    edge_count: usize,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self {
            node_pos: Vec::new(),
            adjacency: Vec::new(),
            spatial_idx: RTree::new(),
            blockages: Vec::new(),
            edge_count: 0,
        }
    }

    /// Build a rectangular grid: nodes every `cell_size` metres over
    /// `width × height`, each connected to its east and north neighbors.
    pub fn grid(width: f32, height: f32, cell_size: f32) -> Self {
        let cols = (width / cell_size).floor() as u32 + 1;
        let rows = (height / cell_size).floor() as u32 + 1;

        let mut graph = Self::new();
        for cx in 0..cols {
            for cy in 0..rows {
                graph.add_node(Point::new(cx as f32 * cell_size, cy as f32 * cell_size));
            }
        }
        let at = |cx: u32, cy: u32| NodeId(cx * rows + cy);
        for cx in 0..cols {
            for cy in 0..rows {
                if cx + 1 < cols {
                    graph.add_edge(at(cx, cy), at(cx + 1, cy), None);
                }
                if cy + 1 < rows {
                    graph.add_edge(at(cx, cy), at(cx, cy + 1), None);
                }
            }
        }
        graph
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn node_pos(&self, id: NodeId) -> Point {
        self.node_pos[id.index()]
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Add a road node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Point) -> NodeId {
        let id = NodeId(self.node_pos.len() as u32);
        self.node_pos.push(pos);
        self.adjacency.push(FxHashMap::default());
        self.spatial_idx.insert(NodeEntry { point: [pos.x, pos.y], id });
        id
    }

    /// Connect `a` and `b` with an undirected edge.  A `None` weight defaults
    /// to the Euclidean distance between the endpoints.  Re-adding an
    /// existing edge overwrites its weight.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: Option<f32>) {
        if a == b || a.index() >= self.node_pos.len() || b.index() >= self.node_pos.len() {
            return;
        }
        let w = weight.unwrap_or_else(|| self.node_pos(a).distance(self.node_pos(b)));
        let fresh = self.adjacency[a.index()].insert(b, w).is_none();
        self.adjacency[b.index()].insert(a, w);
        if fresh {
            self.edge_count += 1;
        }
    }

    /// Remove the edge `{a, b}`.  Returns its weight if it existed.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Option<f32> {
        let w = self.adjacency.get_mut(a.index())?.remove(&b)?;
        self.adjacency[b.index()].remove(&a);
        self.edge_count -= 1;
        Some(w)
    }

    #[inline]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(a.index())
            .is_some_and(|adj| adj.contains_key(&b))
    }

    #[inline]
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f32> {
        self.adjacency.get(a.index())?.get(&b).copied()
    }

    /// Iterate `(neighbor, weight)` pairs of `node`.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        self.adjacency[node.index()].iter().map(|(&n, &w)| (n, w))
    }

    // ── Timed blockages ───────────────────────────────────────────────────

    /// Remove edge `{a, b}` until `expiry_sim_time` (absolute simulated
    /// seconds).  No-op if the edge does not exist.
    pub fn add_temporary_blockage(&mut self, a: NodeId, b: NodeId, expiry_sim_time: f64) {
        if let Some(weight) = self.remove_edge(a, b) {
            self.blockages.push(Blockage { a, b, weight, expiry: expiry_sim_time });
        }
    }

    /// Restore every blocked edge whose `expiry <= now`, re-inserting the
    /// original weight.  Returns the number of edges restored.  Polled by the
    /// scheduler once per tick.
    pub fn restore_expired_blockages(&mut self, now: f64) -> usize {
        let (expired, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.blockages)
            .into_iter()
            .partition(|b| b.expiry <= now);
        self.blockages = keep;
        for b in &expired {
            self.add_edge(b.a, b.b, Some(b.weight));
        }
        expired.len()
    }

    /// Currently blocked edges as `(a, b)` pairs (for the microsim hook).
    pub fn blocked_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.blockages.iter().map(|b| (b.a, b.b)).collect()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The road node nearest to `pos`, `None` only for an empty graph.
    pub fn nearest_node(&self, pos: Point) -> Option<NodeId> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.id)
    }

    /// All nodes within `radius` metres of `pos`.
    pub fn nodes_within(&self, pos: Point, radius: f32) -> Vec<NodeId> {
        self.spatial_idx
            .locate_within_distance([pos.x, pos.y], radius * radius)
            .map(|e| e.id)
            .collect()
    }
}

impl Default for RoadGraph {
    fn default() -> Self {
        Self::new()
    }
}
