use uuid::Uuid;

use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_user_registered(rabbitmq: &RabbitMQClient, user_id: Uuid, email: &str, name: &str) {
    let event = Event::new(
        "skillshikhi-auth",
        routing_keys::AUTH_USER_REGISTERED,
        payloads::UserRegistered {
            user_id,
            email: email.to_string(),
            name: name.to_string(),
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::AUTH_USER_REGISTERED, &event).await {
        tracing::error!(error = %e, "failed to publish user.registered event");
    }
}
