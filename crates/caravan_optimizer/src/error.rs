use thiserror::Error;

/// Build-time validation failures of the routing data model and routing model.
///
/// Every variant is terminal for the input that produced it: the caller has to fix the
/// input and rebuild. Solving never produces a `ModelError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("inconsistent capacity configuration: {0}")]
    InconsistentCapacityConfig(String),

    #[error("invalid pickup and delivery: {0}")]
    InvalidPickupDelivery(String),

    #[error("dimension '{0}' already exists")]
    DuplicateDimensionName(String),

    #[error("invalid capacity for dimension '{dimension}': capacity {capacity} is below the largest transit {max_transit}")]
    InvalidCapacity {
        dimension: String,
        capacity: i64,
        max_transit: i64,
    },

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("unknown transit callback {0}")]
    UnknownTransitCallback(usize),

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
