//! Utility helpers: generational arena, logging latches, and math extensions.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, BodyId, EntityId, InteractionId};
pub use logging::{LogOnce, ScopedTimer};
pub use math::*;
