use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use futures::StreamExt;
use tracing::{error, info, warn};

use crate::api::rest::dto::{
    AccessStatusDto, ChatUpdateDto, DecisionDto, DownloadReq, HistoryEntryDto, NotificationDto,
    NotificationsQuery, PendingPageDto, PendingQuery, RegisterResponseDto, ReplyDto,
};
use crate::api::rest::error::{from_parts, map_domain_error};
use crate::api::rest::identity::CallerIdentity;
use crate::api::rest::problem::ProblemResponse;
use crate::api::rest::sse::SseBroadcaster;
use crate::bot::{BotDispatcher, ChatUpdate};
use crate::contract::model::{Identity, RegisterOutcome};
use crate::domain::service::Service;

/// Register the caller's own access request
pub async fn register(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    uri: Uri,
) -> Result<(StatusCode, Json<RegisterResponseDto>), ProblemResponse> {
    info!("Access request from {}", caller);

    match svc.register(caller).await {
        Ok(outcome) => {
            let status = if outcome == RegisterOutcome::Submitted {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            Ok((status, Json(RegisterResponseDto::new(caller, outcome))))
        }
        Err(e) => {
            error!("Failed to register {}: {}", caller, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Current status of a user
pub async fn get_status(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    Path(user_id): Path<i64>,
    uri: Uri,
) -> Result<Json<AccessStatusDto>, ProblemResponse> {
    let target = Identity(user_id);
    match svc.status(caller, target).await {
        Ok(record) => Ok(Json(AccessStatusDto::from_record(target, record))),
        Err(e) => {
            error!("Failed to get status of {}: {}", target, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Status change history of a user (admin only)
pub async fn get_history(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    Path(user_id): Path<i64>,
    uri: Uri,
) -> Result<Json<Vec<HistoryEntryDto>>, ProblemResponse> {
    let target = Identity(user_id);
    match svc.history(caller, target).await {
        Ok(entries) => Ok(Json(entries.into_iter().map(HistoryEntryDto::from).collect())),
        Err(e) => {
            error!("Failed to get history of {}: {}", target, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// One page of pending requests (admin only)
pub async fn list_pending(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    Query(query): Query<PendingQuery>,
    uri: Uri,
) -> Result<Json<PendingPageDto>, ProblemResponse> {
    info!("Listing pending requests with query: {:?}", query);

    match svc
        .list_pending(caller, query.page.unwrap_or(1), query.page_size)
        .await
    {
        Ok(page) => Ok(Json(PendingPageDto::from(page))),
        Err(e) => {
            error!("Failed to list pending requests: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Approve a pending request (admin only)
pub async fn approve(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    Path(user_id): Path<i64>,
    uri: Uri,
) -> Result<Json<DecisionDto>, ProblemResponse> {
    let target = Identity(user_id);
    info!("Approving {}", target);

    match svc.approve(caller, target).await {
        Ok(decision) => Ok(Json(DecisionDto::new(target, decision))),
        Err(e) => {
            error!("Failed to approve {}: {}", target, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Reject a pending request (admin only)
pub async fn reject(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    Path(user_id): Path<i64>,
    uri: Uri,
) -> Result<Json<DecisionDto>, ProblemResponse> {
    let target = Identity(user_id);
    info!("Rejecting {}", target);

    match svc.reject(caller, target).await {
        Ok(decision) => Ok(Json(DecisionDto::new(target, decision))),
        Err(e) => {
            error!("Failed to reject {}: {}", target, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Start a download for the (approved) caller
pub async fn request_download(
    Extension(svc): Extension<Arc<Service>>,
    CallerIdentity(caller): CallerIdentity,
    uri: Uri,
    Json(req): Json<DownloadReq>,
) -> Result<StatusCode, ProblemResponse> {
    match svc.request_download(caller, &req.url).await {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(e) => {
            warn!("Download request from {} refused: {}", caller, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Feed one chat update to the bot and return its replies
pub async fn chat_update(
    Extension(bot): Extension<Arc<BotDispatcher>>,
    uri: Uri,
    Json(req): Json<ChatUpdateDto>,
) -> Result<Json<Vec<ReplyDto>>, ProblemResponse> {
    let update = ChatUpdate::try_from(req).map_err(|detail| {
        from_parts(
            StatusCode::BAD_REQUEST,
            "CHAT_UPDATE_INVALID",
            "Invalid chat update",
            detail,
            uri.path(),
        )
    })?;

    let replies = bot.handle(update).await;
    Ok(Json(replies.iter().map(ReplyDto::from).collect()))
}

/// SSE stream of outbound chat notifications
pub async fn notifications(
    Extension(sse): Extension<SseBroadcaster<NotificationDto>>,
    Query(query): Query<NotificationsQuery>,
) -> impl IntoResponse {
    info!("New SSE connection for chat notifications");
    let to = query.to;
    let stream = sse
        .subscribe_stream()
        .filter(move |n| futures::future::ready(to.map_or(true, |id| n.message.to == id)));
    SseBroadcaster::sse_named(stream, "chat_notification")
}
