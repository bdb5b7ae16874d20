use diesel::prelude::*;
use uuid::Uuid;

use crate::models::NewAdminAction;
use crate::schema::admin_actions;

/// Append one row to the admin audit log. Every moderation mutation calls
/// this after its primary write succeeds.
pub fn record(
    conn: &mut diesel::pg::PgConnection,
    admin_id: Uuid,
    action: &str,
    target_user_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) -> Result<(), diesel::result::Error> {
    let entry = NewAdminAction {
        admin_id,
        action: action.to_string(),
        target_user_id,
        details,
    };

    diesel::insert_into(admin_actions::table)
        .values(&entry)
        .execute(conn)?;

    Ok(())
}
