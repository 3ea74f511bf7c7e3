use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{attachment, message, thread_member};

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or extend all tables from the entity definitions.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("chat_server::entity::*")
        .sync(db)
        .await?;
    ensure_indexes(db).await
}

/// Ensure the composite indexes the history queries rely on exist.
///
/// Schema sync only knows about single-column indexes, so these are created
/// on startup. Failures are logged and tolerated.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    // Newest-first history scans:
    // SELECT ... FROM message WHERE thread_id = ? ORDER BY created_at DESC, id DESC
    let statements = [
        (
            "idx_message_thread_created",
            Index::create()
                .if_not_exists()
                .name("idx_message_thread_created")
                .table(message::Entity)
                .col(message::Column::ThreadId)
                .col(message::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_thread_member_user",
            Index::create()
                .if_not_exists()
                .name("idx_thread_member_user")
                .table(thread_member::Entity)
                .col(thread_member::Column::UserId)
                .to_owned(),
        ),
        (
            "idx_attachment_message_created",
            Index::create()
                .if_not_exists()
                .name("idx_attachment_message_created")
                .table(attachment::Entity)
                .col(attachment::Column::MessageId)
                .col(attachment::Column::CreatedAt)
                .to_owned(),
        ),
    ];

    for (name, stmt) in statements {
        match db.execute_raw(backend.build(&stmt)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
