//! Route tree. Resources are mounted under a versioned prefix.

mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn api_routes() -> OpenApiRouter<AppState> {
    let resources = OpenApiRouter::new()
        .nest("/threads", v1::thread_routes())
        .nest("/messages", v1::message_routes())
        .nest("/files", v1::file_routes())
        .nest("/users", v1::user_routes());

    OpenApiRouter::new().nest(API_PREFIX, resources)
}
