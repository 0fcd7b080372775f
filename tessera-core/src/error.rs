use uuid::Uuid;

/// Failures surfaced by the booking service. The hosting API layer maps
/// these onto user-facing responses.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: i32, available: i32 },

    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i32),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures raised by store implementations. `Unavailable` marks transient
/// backend trouble and is the only kind the service retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Internal(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => BookingError::Unavailable(reason),
            StoreError::Internal(reason) => BookingError::Unavailable(reason),
        }
    }
}
