//! Order Engine
//!
//! Converts a cart (or an ad-hoc product list) into an immutable order
//! snapshot, moves stock through the atomic conditional primitive, and
//! drives the order/payment status machines.

mod engine;

pub use engine::{OrderEngine, PlaceOrderItem, StatusKind};
