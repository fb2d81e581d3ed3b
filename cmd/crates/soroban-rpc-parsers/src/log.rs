pub mod diagnostic_events;

pub use diagnostic_events::*;
