//! Domain layer - shared value objects and policy types.

pub mod foundation;
