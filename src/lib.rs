//! Client-side router for a dynamic cluster of database nodes.

pub mod admin;
pub mod balancer;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod router;
pub mod topology;

pub use config::schema::RouterConfig;
pub use error::{RouterError, RouterResult};
pub use lifecycle::Shutdown;
pub use router::ClusterRouter;
