use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::types::event::{payloads, routing_keys, Event};

use crate::models::Message;

pub async fn publish_message_sent(
    rabbitmq: &RabbitMQClient,
    message: &Message,
    sender_name: &str,
    content_preview: &str,
) {
    let event = Event::new(
        "skillshikhi-messaging",
        routing_keys::MESSAGING_MESSAGE_SENT,
        payloads::MessageSent {
            message_id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            sender_name: sender_name.to_string(),
            content_preview: content_preview.to_string(),
        },
    )
    .with_user(message.sender_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MESSAGING_MESSAGE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish message.sent event");
    }
}
