use std::sync::Arc;

use diesel::prelude::*;
use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use crate::models::NewAnalyticsEvent;
use crate::schema::analytics_events;
use crate::AppState;

/// Listen to ALL SkillShikhi events via the wildcard binding
/// `skillshikhi.#`. Each event lands in analytics_events with:
/// - event_type from the routing key
/// - properties from the full JSON payload
/// - user_id extracted from the event envelope if present
pub async fn listen_all_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let consumer = state.rabbitmq.subscribe(
        "skillshikhi-analytics.all",
        &["skillshikhi.#"],
    ).await?;

    tracing::info!("analytics subscriber listening on skillshikhi.# (all events)");

    let mut consumer = consumer;
    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                let event_json: serde_json::Value = match serde_json::from_slice(&delivery.data) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::error!(error = %e, routing_key = %routing_key, "failed to parse event JSON");
                        let _ = delivery.ack(BasicAckOptions::default()).await;
                        continue;
                    }
                };

                // Extract user_id from the event envelope (if present)
                let user_id = event_json
                    .get("user_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| uuid::Uuid::parse_str(s).ok());

                let new_event = NewAnalyticsEvent {
                    user_id,
                    event_type: routing_key.clone(),
                    properties: Some(event_json),
                };

                let mut conn = match state.db.get() {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to get db connection");
                        let _ = delivery.ack(BasicAckOptions::default()).await;
                        continue;
                    }
                };

                match diesel::insert_into(analytics_events::table)
                    .values(&new_event)
                    .execute(&mut conn)
                {
                    Ok(_) => {
                        tracing::debug!(
                            routing_key = %routing_key,
                            user_id = ?user_id,
                            "analytics event recorded"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            routing_key = %routing_key,
                            "failed to insert analytics event"
                        );
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "analytics consumer error");
            }
        }
    }

    Ok(())
}
