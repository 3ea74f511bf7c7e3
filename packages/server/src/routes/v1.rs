use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{file, message, thread, user};
use crate::state::AppState;

pub(super) fn thread_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(thread::list_threads))
        .routes(routes!(thread::open_direct))
        .routes(routes!(thread::create_group))
        .routes(routes!(thread::set_muted))
        .routes(routes!(thread::leave_thread))
        .routes(routes!(thread::toggle_pin))
        .routes(routes!(thread::add_members))
        .routes(routes!(thread::thread_info))
        .routes(routes!(message::list_messages, message::send_message))
        .routes(routes!(message::search_messages))
}

pub(super) fn message_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(message::edit_message, message::delete_message))
        .routes(routes!(message::hide_message))
        .routes(routes!(message::toggle_pin))
}

pub(super) fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(file::confirm_upload))
        .routes(routes!(file::download_url))
}

pub(super) fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_blocked))
        .routes(routes!(user::toggle_block))
}
