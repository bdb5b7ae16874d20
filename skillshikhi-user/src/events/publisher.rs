use uuid::Uuid;

use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_friend_requested(
    rabbitmq: &RabbitMQClient,
    requester_id: Uuid,
    recipient_id: Uuid,
    requester_name: &str,
) {
    let event = Event::new(
        "skillshikhi-user",
        routing_keys::USER_FRIEND_REQUESTED,
        payloads::FriendRequested {
            requester_id,
            recipient_id,
            requester_name: requester_name.to_string(),
        },
    )
    .with_user(requester_id);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_FRIEND_REQUESTED, &event).await {
        tracing::error!(error = %e, "failed to publish friend.requested event");
    }
}

pub async fn publish_friend_accepted(
    rabbitmq: &RabbitMQClient,
    requester_id: Uuid,
    recipient_id: Uuid,
    recipient_name: &str,
) {
    let event = Event::new(
        "skillshikhi-user",
        routing_keys::USER_FRIEND_ACCEPTED,
        payloads::FriendAccepted {
            requester_id,
            recipient_id,
            recipient_name: recipient_name.to_string(),
        },
    )
    .with_user(recipient_id);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_FRIEND_ACCEPTED, &event).await {
        tracing::error!(error = %e, "failed to publish friend.accepted event");
    }
}

pub async fn publish_friend_removed(rabbitmq: &RabbitMQClient, user_id: Uuid, other_id: Uuid) {
    let event = Event::new(
        "skillshikhi-user",
        routing_keys::USER_FRIEND_REMOVED,
        payloads::FriendRemoved { user_id, other_id },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_FRIEND_REMOVED, &event).await {
        tracing::error!(error = %e, "failed to publish friend.removed event");
    }
}
