use std::sync::Arc;

use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text, Uuid as SqlUuid, VarChar};
use uuid::Uuid;

use skillshikhi_shared::clients::db::DbPool;
use skillshikhi_shared::errors::{AppError, AppResult};

use crate::schema::device_sessions;
use crate::AppState;

/// Classify a raw user-agent string into a coarse device bucket.
pub fn classify_device(user_agent: Option<&str>) -> Option<String> {
    let ua = user_agent?;
    let ua_lower = ua.to_lowercase();

    let device = if ua_lower.contains("iphone") || ua_lower.contains("ipad") {
        "ios"
    } else if ua_lower.contains("android") {
        "android"
    } else if ua_lower.contains("windows") {
        "windows"
    } else if ua_lower.contains("macintosh") || ua_lower.contains("mac os") {
        "macos"
    } else if ua_lower.contains("linux") {
        "linux"
    } else {
        "unknown"
    };

    Some(device.to_string())
}

/// Record a heartbeat for the session identified by the token's `jti`.
///
/// Inserts the session on first sight; on subsequent heartbeats only
/// `last_activity` (and the possibly changed address) is refreshed. A
/// terminated session is never reactivated by a heartbeat, so the upsert is
/// guarded on `is_active`.
pub fn record_heartbeat(
    pool: &DbPool,
    user_id: Uuid,
    token_id: Uuid,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<()> {
    let mut conn = pool
        .get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let device = classify_device(user_agent.as_deref());

    diesel::sql_query(
        "INSERT INTO device_sessions (user_id, token_id, ip_address, user_agent, device) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (token_id) DO UPDATE \
         SET last_activity = NOW(), ip_address = EXCLUDED.ip_address \
         WHERE device_sessions.is_active",
    )
    .bind::<SqlUuid, _>(user_id)
    .bind::<SqlUuid, _>(token_id)
    .bind::<Nullable<VarChar>, _>(ip_address)
    .bind::<Nullable<Text>, _>(user_agent)
    .bind::<Nullable<VarChar>, _>(device)
    .execute(&mut conn)?;

    Ok(())
}

/// Spawn a background task that marks sessions inactive once their
/// `last_activity` is older than the configured idle TTL.
pub fn spawn_expiry_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));

        loop {
            interval.tick().await;

            let idle_cutoff = chrono::Utc::now()
                - chrono::Duration::seconds(state.config.session_idle_ttl);

            let mut conn = match state.db.get() {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "session expiry: db pool error");
                    continue;
                }
            };

            let expired = diesel::update(
                device_sessions::table
                    .filter(device_sessions::is_active.eq(true))
                    .filter(device_sessions::last_activity.lt(idle_cutoff)),
            )
            .set((
                device_sessions::is_active.eq(false),
                device_sessions::ended_at.eq(chrono::Utc::now()),
                device_sessions::termination_reason.eq("idle timeout"),
            ))
            .execute(&mut conn);

            match expired {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "expired idle device sessions"),
                Err(e) => tracing::error!(error = %e, "session expiry failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::classify_device;

    #[test]
    fn classifies_common_agents() {
        let chrome_win = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
        let safari_ios = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        let chrome_android = "Mozilla/5.0 (Linux; Android 14; Pixel 8)";

        assert_eq!(classify_device(Some(chrome_win)).unwrap(), "windows");
        assert_eq!(classify_device(Some(safari_ios)).unwrap(), "ios");
        assert_eq!(classify_device(Some(chrome_android)).unwrap(), "android");
    }

    #[test]
    fn unknown_and_missing_agents() {
        assert_eq!(classify_device(Some("curl/8.4.0")).unwrap(), "unknown");
        assert!(classify_device(None).is_none());
    }
}
