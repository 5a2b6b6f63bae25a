//! Peripheral drivers built on the `embedded_hal` digital traits.

pub mod button;
pub mod indicator;
