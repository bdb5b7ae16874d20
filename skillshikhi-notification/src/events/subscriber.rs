use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use skillshikhi_shared::types::event::{payloads, routing_keys, Event};

use crate::services::notification_service;
use crate::AppState;

/// Listen for friendship events (friend.requested, friend.accepted).
pub async fn listen_friend_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "skillshikhi-notification.friend",
        &[
            routing_keys::USER_FRIEND_REQUESTED,
            routing_keys::USER_FRIEND_ACCEPTED,
        ],
    ).await?;

    tracing::info!("listening for friendship events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::USER_FRIEND_REQUESTED {
                    match serde_json::from_slice::<Event<payloads::FriendRequested>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                data.recipient_id,
                                "friend_requested",
                                "New friend request",
                                &format!("{} wants to be your friend", data.requester_name),
                                Some(serde_json::json!({
                                    "requester_id": data.requester_id,
                                    "requester_name": data.requester_name,
                                })),
                            ) {
                                tracing::error!(error = %e, "failed to create friend_requested notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize friend.requested event");
                        }
                    }
                } else if routing_key == routing_keys::USER_FRIEND_ACCEPTED {
                    match serde_json::from_slice::<Event<payloads::FriendAccepted>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                data.requester_id,
                                "friend_accepted",
                                "Friend request accepted",
                                &format!("{} accepted your friend request", data.recipient_name),
                                Some(serde_json::json!({
                                    "recipient_id": data.recipient_id,
                                })),
                            ) {
                                tracing::error!(error = %e, "failed to create friend_accepted notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize friend.accepted event");
                        }
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "friend consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for teaching-session events (request.created, request.transitioned).
pub async fn listen_session_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "skillshikhi-notification.session",
        &[
            routing_keys::SESSION_REQUESTED,
            routing_keys::SESSION_TRANSITIONED,
        ],
    ).await?;

    tracing::info!("listening for session events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::SESSION_REQUESTED {
                    match serde_json::from_slice::<Event<payloads::SessionRequested>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                data.to_user_id,
                                "session_requested",
                                "New session request",
                                &format!("{} wants to learn {} from you", data.from_user_name, data.skill),
                                Some(serde_json::json!({
                                    "request_id": data.request_id,
                                    "from_user_id": data.from_user_id,
                                    "skill": data.skill,
                                })),
                            ) {
                                tracing::error!(error = %e, "failed to create session_requested notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize session.request.created event");
                        }
                    }
                } else if routing_key == routing_keys::SESSION_TRANSITIONED {
                    match serde_json::from_slice::<Event<payloads::SessionTransitioned>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            // Notify the party that did not act.
                            let recipient = if data.acted_by == data.from_user_id {
                                data.to_user_id
                            } else {
                                data.from_user_id
                            };
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                recipient,
                                "session_updated",
                                "Session request updated",
                                &format!("your {} session request is now {}", data.skill, data.status),
                                Some(serde_json::json!({
                                    "request_id": data.request_id,
                                    "status": data.status,
                                    "skill": data.skill,
                                })),
                            ) {
                                tracing::error!(error = %e, "failed to create session_updated notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize session.request.transitioned event");
                        }
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "session consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for message events (message.sent).
pub async fn listen_message_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "skillshikhi-notification.message",
        &[routing_keys::MESSAGING_MESSAGE_SENT],
    ).await?;

    tracing::info!("listening for message events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::MessageSent>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            data.recipient_id,
                            "message_received",
                            "New message",
                            &format!("New message from {}", data.sender_name),
                            Some(serde_json::json!({
                                "message_id": data.message_id,
                                "sender_id": data.sender_id,
                                "sender_name": data.sender_name,
                                "content_preview": data.content_preview,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to create message notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize message.sent event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "message consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for moderation events (report.reviewed, user.banned, user.unbanned).
pub async fn listen_moderation_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "skillshikhi-notification.moderation",
        &[
            routing_keys::MODERATION_REPORT_REVIEWED,
            routing_keys::MODERATION_USER_BANNED,
            routing_keys::MODERATION_USER_UNBANNED,
        ],
    ).await?;

    tracing::info!("listening for moderation events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::MODERATION_REPORT_REVIEWED {
                    match serde_json::from_slice::<Event<payloads::ReportReviewed>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                data.reporter_id,
                                "report_reviewed",
                                "Report update",
                                &format!("your report has been {}", data.status),
                                Some(serde_json::json!({
                                    "report_id": data.report_id,
                                    "status": data.status,
                                })),
                            ) {
                                tracing::error!(error = %e, "failed to create report_reviewed notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize report.reviewed event");
                        }
                    }
                } else if routing_key == routing_keys::MODERATION_USER_BANNED {
                    match serde_json::from_slice::<Event<payloads::UserBanned>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                data.user_id,
                                "account_banned",
                                "Account banned",
                                &format!("Your account has been banned: {}", data.reason),
                                Some(serde_json::json!({ "reason": data.reason })),
                            ) {
                                tracing::error!(error = %e, "failed to create account_banned notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize user.banned event");
                        }
                    }
                } else if routing_key == routing_keys::MODERATION_USER_UNBANNED {
                    match serde_json::from_slice::<Event<payloads::UserUnbanned>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if let Err(e) = notification_service::create_notification(
                                &state.db,
                                data.user_id,
                                "account_unbanned",
                                "Account restored",
                                "Your account ban has been lifted",
                                None,
                            ) {
                                tracing::error!(error = %e, "failed to create account_unbanned notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize user.unbanned event");
                        }
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "moderation consumer error");
            }
        }
    }

    Ok(())
}
