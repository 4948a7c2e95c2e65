//! Status codes for container, traversal, manager and query server operations
//!
//! Success is always `Ok(())`; these enums only list the failures.

/// Failure of a fixed-capacity container operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    /// The container is full
    FullBuffer,
    /// The operation reaches outside the container memory (empty container, missing memory)
    OutOfRange,
}

/// Result type for container operations
pub type ContainerResult = std::result::Result<(), ContainerError>;

impl std::error::Error for ContainerError {}

impl std::fmt::Display for ContainerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerError::FullBuffer => write!(f, "Buffer is full"),
            ContainerError::OutOfRange => write!(f, "Out of range"),
        }
    }
}

/// Failure of a traversal `search()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalError {
    InvalidMemoryForOpenNodes,
    LackOfMemoryForOpenNodes,
    InvalidMemoryForClosedNodes,
    LackOfMemoryForClosedNodes,
    InvalidMemoryForVisitedNodes,
    LackOfMemoryForVisitedNodes,
}

/// Result type for traversals
pub type TraversalResult = std::result::Result<(), TraversalError>;

impl TraversalError {
    pub(crate) fn for_open_nodes(err: ContainerError) -> Self {
        match err {
            ContainerError::FullBuffer => TraversalError::LackOfMemoryForOpenNodes,
            ContainerError::OutOfRange => TraversalError::InvalidMemoryForOpenNodes,
        }
    }

    pub(crate) fn for_closed_nodes(err: ContainerError) -> Self {
        match err {
            ContainerError::FullBuffer => TraversalError::LackOfMemoryForClosedNodes,
            ContainerError::OutOfRange => TraversalError::InvalidMemoryForClosedNodes,
        }
    }

    pub(crate) fn for_visited_nodes(err: ContainerError) -> Self {
        match err {
            ContainerError::FullBuffer => TraversalError::LackOfMemoryForVisitedNodes,
            ContainerError::OutOfRange => TraversalError::InvalidMemoryForVisitedNodes,
        }
    }
}

impl std::error::Error for TraversalError {}

impl std::fmt::Display for TraversalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraversalError::InvalidMemoryForOpenNodes => write!(f, "Invalid memory for open nodes"),
            TraversalError::LackOfMemoryForOpenNodes => write!(f, "Lack of memory for open nodes"),
            TraversalError::InvalidMemoryForClosedNodes => {
                write!(f, "Invalid memory for closed nodes")
            }
            TraversalError::LackOfMemoryForClosedNodes => {
                write!(f, "Lack of memory for closed nodes")
            }
            TraversalError::InvalidMemoryForVisitedNodes => {
                write!(f, "Invalid memory for visited nodes")
            }
            TraversalError::LackOfMemoryForVisitedNodes => {
                write!(f, "Lack of memory for visited nodes")
            }
        }
    }
}

/// Failure of a query server call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryServerError {
    #[error("query failed")]
    Failed,
    #[error("lack of result memory")]
    LackOfResultMemory,
    #[error("lack of working memory")]
    LackOfWorkingMemory,
    #[error("lack of propagation memory")]
    LackOfPropagationMemory,
}

/// Result type for query server calls
pub type QueryServerResult = std::result::Result<(), QueryServerError>;

impl From<TraversalError> for QueryServerError {
    fn from(err: TraversalError) -> Self {
        match err {
            TraversalError::LackOfMemoryForOpenNodes | TraversalError::LackOfMemoryForClosedNodes => {
                QueryServerError::LackOfWorkingMemory
            }
            TraversalError::LackOfMemoryForVisitedNodes => QueryServerError::LackOfPropagationMemory,
            TraversalError::InvalidMemoryForOpenNodes
            | TraversalError::InvalidMemoryForClosedNodes
            | TraversalError::InvalidMemoryForVisitedNodes => QueryServerError::Failed,
        }
    }
}

/// Failure of a NavMeshManager insertion or removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NavMeshManagerError {
    #[error("invalid navmesh")]
    InvalidNavMesh,
    #[error("invalid navcell")]
    InvalidNavCell,
    #[error("navmesh already loaded")]
    NavMeshAlreadyLoaded,
    #[error("navcell already loaded")]
    NavCellAlreadyLoaded,
    #[error("navmesh not loaded")]
    NavMeshNotLoaded,
    #[error("navcell not loaded")]
    NavCellNotLoaded,
    #[error("navmesh overlaps already loaded data")]
    NavMeshOverlapAlreadyLoadedData,
    #[error("navmesh manager error")]
    Error,
}

impl From<QueryServerError> for navmesh_common::Error {
    fn from(err: QueryServerError) -> Self {
        navmesh_common::Error::NavMesh(err.to_string())
    }
}

impl From<TraversalError> for navmesh_common::Error {
    fn from(err: TraversalError) -> Self {
        navmesh_common::Error::NavMesh(err.to_string())
    }
}

impl From<NavMeshManagerError> for navmesh_common::Error {
    fn from(err: NavMeshManagerError) -> Self {
        navmesh_common::Error::NavMesh(err.to_string())
    }
}
