use uuid::Uuid;

use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::types::auth::UserRole;
use skillshikhi_shared::types::event::{payloads, routing_keys, Event};

use crate::models::Report;

pub async fn publish_report_created(
    rabbitmq: &RabbitMQClient,
    report_id: Uuid,
    reporter_id: Uuid,
    reported_id: Uuid,
    reason: &str,
) {
    let event = Event::new(
        "skillshikhi-moderation",
        routing_keys::MODERATION_REPORT_CREATED,
        payloads::ReportCreated {
            report_id,
            reporter_id,
            reported_id,
            reason: reason.to_string(),
        },
    )
    .with_user(reporter_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_REPORT_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish report.created event");
    }
}

pub async fn publish_report_reviewed(rabbitmq: &RabbitMQClient, report: &Report, reviewed_by: Uuid) {
    let event = Event::new(
        "skillshikhi-moderation",
        routing_keys::MODERATION_REPORT_REVIEWED,
        payloads::ReportReviewed {
            report_id: report.id,
            reporter_id: report.reporter_id,
            reported_id: report.reported_id,
            status: report.status.clone(),
            reviewed_by,
        },
    )
    .with_user(reviewed_by);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_REPORT_REVIEWED, &event).await {
        tracing::error!(error = %e, "failed to publish report.reviewed event");
    }
}

pub async fn publish_user_banned(rabbitmq: &RabbitMQClient, user_id: Uuid, reason: &str, banned_by: Uuid) {
    let event = Event::new(
        "skillshikhi-moderation",
        routing_keys::MODERATION_USER_BANNED,
        payloads::UserBanned {
            user_id,
            reason: reason.to_string(),
            banned_by,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_USER_BANNED, &event).await {
        tracing::error!(error = %e, "failed to publish user.banned event");
    }
}

pub async fn publish_user_unbanned(rabbitmq: &RabbitMQClient, user_id: Uuid, unbanned_by: Uuid) {
    let event = Event::new(
        "skillshikhi-moderation",
        routing_keys::MODERATION_USER_UNBANNED,
        payloads::UserUnbanned { user_id, unbanned_by },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_USER_UNBANNED, &event).await {
        tracing::error!(error = %e, "failed to publish user.unbanned event");
    }
}

pub async fn publish_role_changed(
    rabbitmq: &RabbitMQClient,
    user_id: Uuid,
    new_role: UserRole,
    changed_by: Uuid,
) {
    let event = Event::new(
        "skillshikhi-moderation",
        routing_keys::MODERATION_ROLE_CHANGED,
        payloads::RoleChanged {
            user_id,
            new_role: new_role.to_string(),
            changed_by,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_ROLE_CHANGED, &event).await {
        tracing::error!(error = %e, "failed to publish user.role_changed event");
    }
}
