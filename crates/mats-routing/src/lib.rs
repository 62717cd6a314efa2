//! `mats-routing` — road network and route computation.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`graph`]    | `RoadGraph` — mutable undirected graph + R-tree node snap   |
//! | [`astar`]    | `AStarRouter` with corrected heuristic and route cache      |
//! | [`dijkstra`] | `DijkstraRouter` — heuristic-free alternative               |
//! | [`dynamic`]  | `DynamicRouter` — congestion-weighted routing view          |
//!
//! # Path contract
//!
//! All routers return `Option<Vec<Point>>`: a position sequence
//! `[query_start, intermediate node positions…, query_end]`, or
//! `[query_start, query_end]` when both endpoints snap to the same node,
//! or `None` when no path exists.  `None` is a recoverable condition —
//! callers keep their previous route and log.

pub mod astar;
pub mod dijkstra;
pub mod dynamic;
pub mod graph;


pub use astar::{AStarRouter, RouteCache, RouterStats};
pub use dijkstra::DijkstraRouter;
pub use dynamic::DynamicRouter;
pub use graph::RoadGraph;
