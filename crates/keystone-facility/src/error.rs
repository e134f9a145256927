use keystone_types::{EntityId, ErrorKind, RepositoryId};

use crate::model::Category;

/// Errors from facility reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    /// No repository is registered under this id.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryId),

    /// No repository tracks this building.
    #[error("no repository for building {0}")]
    NoRepositoryForBuilding(EntityId),

    /// The building does not exist.
    #[error("building not found: {0}")]
    BuildingNotFound(EntityId),

    /// An entity of the given category does not exist.
    #[error("{category} entity not found: {id}")]
    EntityNotFound { category: Category, id: EntityId },

    /// A write was rejected because the entity is malformed for its context.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// Entity encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing storage failed.
    #[error("facility backend error: {0}")]
    Backend(String),
}

impl FacilityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RepositoryNotFound(_)
            | Self::NoRepositoryForBuilding(_)
            | Self::BuildingNotFound(_)
            | Self::EntityNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidEntity(_) => ErrorKind::Config,
            Self::Serialization(_) | Self::Backend(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_json::Error> for FacilityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for facility operations.
pub type FacilityResult<T> = Result<T, FacilityError>;
