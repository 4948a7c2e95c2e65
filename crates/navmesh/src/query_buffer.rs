//! Memory used by the query server, allocated once and reused across queries

use navmesh_common::Result;

use crate::config::QueryBufferConfig;
use crate::nav_mesh_types::{NavFloorKey, NavTriangleKey};
use crate::traversal::PropagationNode;

/// Result, working and propagation regions of a [`NavMeshQueryServer`](crate::NavMeshQueryServer).
///
/// The working region is split in two halves: the open set (a heap of propagation nodes,
/// or a queue of triangle keys for breadth-first searches) and the closed set.
#[derive(Debug, Clone)]
pub struct NavMeshQueryBuffer {
    config: QueryBufferConfig,
    pub(crate) open_nodes: Vec<PropagationNode>,
    pub(crate) open_keys: Vec<NavTriangleKey>,
    pub(crate) closed: Vec<NavTriangleKey>,
    pub(crate) propagation: Vec<NavTriangleKey>,
    pub(crate) result_triangles: Vec<NavTriangleKey>,
    pub(crate) result_floors: Vec<NavFloorKey>,
}

impl NavMeshQueryBuffer {
    pub fn new(config: &QueryBufferConfig) -> Result<Self> {
        config.validate()?;
        let open_bytes = config.working_bytes / 2;
        Ok(Self {
            config: *config,
            open_nodes: vec![PropagationNode::default(); config.open_node_capacity()],
            open_keys: vec![NavTriangleKey::default(); open_bytes / std::mem::size_of::<NavTriangleKey>()],
            closed: vec![NavTriangleKey::default(); config.closed_node_capacity()],
            propagation: vec![NavTriangleKey::default(); config.propagation_capacity()],
            result_triangles: vec![NavTriangleKey::default(); config.result_capacity()],
            result_floors: vec![
                NavFloorKey::default();
                config.result_bytes / std::mem::size_of::<NavFloorKey>()
            ],
        })
    }

    pub fn config(&self) -> &QueryBufferConfig {
        &self.config
    }

    pub fn open_node_capacity(&self) -> usize {
        self.open_nodes.len()
    }

    pub fn closed_node_capacity(&self) -> usize {
        self.closed.len()
    }

    pub fn propagation_capacity(&self) -> usize {
        self.propagation.len()
    }

    pub fn result_triangle_capacity(&self) -> usize {
        self.result_triangles.len()
    }

    pub fn result_floor_capacity(&self) -> usize {
        self.result_floors.len()
    }
}
