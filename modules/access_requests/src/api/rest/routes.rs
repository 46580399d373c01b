use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::dto::NotificationDto;
use crate::api::rest::handlers;
use crate::api::rest::sse::SseBroadcaster;
use crate::bot::BotDispatcher;
use crate::domain::service::Service;

pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    bot: Arc<BotDispatcher>,
    notifications: SseBroadcaster<NotificationDto>,
) -> Router {
    router
        // Access requests
        .route("/access-requests", post(handlers::register))
        .route("/access-requests/pending", get(handlers::list_pending))
        .route("/access-requests/{user_id}", get(handlers::get_status))
        .route("/access-requests/{user_id}/history", get(handlers::get_history))
        .route("/access-requests/{user_id}/approve", post(handlers::approve))
        .route("/access-requests/{user_id}/reject", post(handlers::reject))
        // Downloads
        .route("/downloads", post(handlers::request_download))
        // Chat transport
        .route("/chat/updates", post(handlers::chat_update))
        .route("/chat/notifications", get(handlers::notifications))
        .layer(Extension(service))
        .layer(Extension(bot))
        .layer(Extension(notifications))
}
