use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait};
use stringline_types::{create_id, now};

use crate::{entity::notification, error::ApiError};

pub async fn notify(
    conn: &impl ConnectionTrait,
    user_id: &str,
    title: impl Into<String>,
    body: impl Into<String>,
) -> Result<(), ApiError> {
    notification::ActiveModel {
        id: Set(create_id()),
        user_id: Set(user_id.to_string()),
        title: Set(title.into()),
        body: Set(body.into()),
        read: Set(false),
        read_at: Set(None),
        created_at: Set(now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}
