//! Backend route proxy.
//!
//! Selected public API paths are forwarded to the backend service; everything
//! else, including the local `/api/auth/*` routes, stays with this service.

pub mod forward;
pub mod table;

pub use forward::{ForwardError, Forwarder, proxy_layer};
pub use table::{Resolved, RouteRule, RouteTable, RouteTableError};
