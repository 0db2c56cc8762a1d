//! Admin API exposing the router's endpoint table.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::{get_endpoints, get_status};
use crate::endpoint::Connector;
use crate::router::ClusterRouter;

/// Shared state handed to admin handlers.
pub struct AdminState<K: Connector> {
    pub router: Arc<ClusterRouter<K>>,
}

// Derived Clone would require `K: Clone`.
impl<K: Connector> Clone for AdminState<K> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
        }
    }
}

pub fn setup_admin_router<K: Connector>(router: Arc<ClusterRouter<K>>, api_key: &str) -> Router {
    let api_key: Arc<str> = Arc::from(api_key);

    Router::new()
        .route("/admin/status", get(get_status::<K>))
        .route("/admin/endpoints", get(get_endpoints::<K>))
        .layer(middleware::from_fn_with_state(api_key, admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(AdminState { router })
}
