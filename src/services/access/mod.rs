//! Access Decision Filter logic: route classification + per-request decision.

pub mod decision;
pub mod routes;

pub use decision::{AccessDecision, AccessPolicy, HOME_PATH, decide};
pub use routes::{RouteClass, RoutePatternError, RouteTable};
