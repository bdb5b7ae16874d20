use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct HeartbeatPayload {
    user_id: Uuid,
    token_id: Uuid,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

/// Fire-and-forget session heartbeat.
///
/// Detached from the request path entirely: the spawned task owns its data,
/// and a slow or failing auth service costs the original request nothing.
/// Failures are logged at warn and swallowed.
pub fn dispatch(
    http_client: reqwest::Client,
    auth_url: &str,
    user_id: Uuid,
    token_id: Uuid,
    ip_address: Option<String>,
    user_agent: Option<String>,
) {
    let url = format!("{auth_url}/internal/sessions/heartbeat");
    let payload = HeartbeatPayload {
        user_id,
        token_id,
        ip_address,
        user_agent,
    };

    tokio::spawn(async move {
        match http_client.post(&url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "session heartbeat rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "session heartbeat failed");
            }
        }
    });
}
