use uuid::Uuid;

use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::types::event::{payloads, routing_keys, Event};

use crate::models::SessionRequest;

pub async fn publish_session_requested(
    rabbitmq: &RabbitMQClient,
    request: &SessionRequest,
    from_user_name: &str,
) {
    let event = Event::new(
        "skillshikhi-session",
        routing_keys::SESSION_REQUESTED,
        payloads::SessionRequested {
            request_id: request.id,
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            skill: request.skill.clone(),
            from_user_name: from_user_name.to_string(),
        },
    )
    .with_user(request.from_user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::SESSION_REQUESTED, &event).await {
        tracing::error!(error = %e, "failed to publish session.request.created event");
    }
}

pub async fn publish_session_transitioned(
    rabbitmq: &RabbitMQClient,
    request: &SessionRequest,
    acted_by: Uuid,
) {
    let event = Event::new(
        "skillshikhi-session",
        routing_keys::SESSION_TRANSITIONED,
        payloads::SessionTransitioned {
            request_id: request.id,
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            skill: request.skill.clone(),
            status: request.status.clone(),
            acted_by,
        },
    )
    .with_user(acted_by);

    if let Err(e) = rabbitmq.publish(routing_keys::SESSION_TRANSITIONED, &event).await {
        tracing::error!(error = %e, "failed to publish session.request.transitioned event");
    }
}
