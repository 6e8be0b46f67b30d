//! HTTP surface of the contact relay: routing, request handlers, error bodies
//! and process telemetry.

pub mod contact;
pub mod problem;
pub mod router;
pub mod telemetry;
