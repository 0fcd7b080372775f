pub mod events;
pub mod pii;

pub use events::{BookingCancelledEvent, BookingConfirmedEvent};
pub use pii::Masked;
