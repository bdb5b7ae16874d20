use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date as DieselDate, Jsonb, Text};

use skillshikhi_shared::types::event::routing_keys;

use crate::models::DailySnapshot;
use crate::schema::daily_snapshots;
use crate::AppState;

#[derive(QueryableByName)]
struct CountResult {
    #[diesel(sql_type = BigInt)]
    cnt: i64,
}

#[derive(QueryableByName)]
struct TopEntry {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = BigInt)]
    cnt: i64,
}

/// Recompute and upsert the snapshot for one calendar date.
///
/// Keyed on the date with `ON CONFLICT (date) DO UPDATE`, so repeated calls
/// for the same date overwrite rather than append.
pub fn generate_snapshot(pool: &crate::DbPool, date: NaiveDate) -> anyhow::Result<DailySnapshot> {
    let mut conn = pool.get()?;

    let active_users = count_distinct_active(&mut conn, date)?;
    let new_users = count_events(&mut conn, date, routing_keys::AUTH_USER_REGISTERED)?;
    let sessions_created = count_events(&mut conn, date, routing_keys::SESSION_REQUESTED)?;
    let sessions_completed =
        count_transitions_to(&mut conn, date, routing_keys::SESSION_TRANSITIONED, "completed")?;
    let reports_created = count_events(&mut conn, date, routing_keys::MODERATION_REPORT_CREATED)?;
    let reports_resolved =
        count_transitions_to(&mut conn, date, routing_keys::MODERATION_REPORT_REVIEWED, "resolved")?;
    let moderation_actions = count_moderation_actions(&mut conn, date)?;

    let top_active = top_active_users(&mut conn, date)?;
    let top_reported = top_reported_users(&mut conn, date)?;

    diesel::sql_query(
        "INSERT INTO daily_snapshots \
         (date, active_users, new_users, sessions_created, sessions_completed, \
          reports_created, reports_resolved, moderation_actions, top_active, top_reported, generated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) \
         ON CONFLICT (date) DO UPDATE SET \
           active_users = EXCLUDED.active_users, \
           new_users = EXCLUDED.new_users, \
           sessions_created = EXCLUDED.sessions_created, \
           sessions_completed = EXCLUDED.sessions_completed, \
           reports_created = EXCLUDED.reports_created, \
           reports_resolved = EXCLUDED.reports_resolved, \
           moderation_actions = EXCLUDED.moderation_actions, \
           top_active = EXCLUDED.top_active, \
           top_reported = EXCLUDED.top_reported, \
           generated_at = NOW()",
    )
    .bind::<DieselDate, _>(date)
    .bind::<BigInt, _>(active_users)
    .bind::<BigInt, _>(new_users)
    .bind::<BigInt, _>(sessions_created)
    .bind::<BigInt, _>(sessions_completed)
    .bind::<BigInt, _>(reports_created)
    .bind::<BigInt, _>(reports_resolved)
    .bind::<BigInt, _>(moderation_actions)
    .bind::<Jsonb, _>(top_active)
    .bind::<Jsonb, _>(top_reported)
    .execute(&mut conn)?;

    let snapshot: DailySnapshot = daily_snapshots::table
        .find(date)
        .first(&mut conn)?;

    tracing::info!(
        date = %date,
        active_users = active_users,
        new_users = new_users,
        sessions_created = sessions_created,
        "daily snapshot generated"
    );

    Ok(snapshot)
}

fn count_distinct_active(conn: &mut diesel::pg::PgConnection, date: NaiveDate) -> anyhow::Result<i64> {
    let result = diesel::sql_query(
        "SELECT COUNT(DISTINCT user_id) AS cnt \
         FROM analytics_events \
         WHERE user_id IS NOT NULL \
         AND created_at >= $1::date \
         AND created_at < ($1::date + INTERVAL '1 day')",
    )
    .bind::<DieselDate, _>(date)
    .get_result::<CountResult>(conn)?;

    Ok(result.cnt)
}

fn count_events(
    conn: &mut diesel::pg::PgConnection,
    date: NaiveDate,
    event_type: &str,
) -> anyhow::Result<i64> {
    let result = diesel::sql_query(
        "SELECT COUNT(*) AS cnt \
         FROM analytics_events \
         WHERE event_type = $1 \
         AND created_at >= $2::date \
         AND created_at < ($2::date + INTERVAL '1 day')",
    )
    .bind::<Text, _>(event_type)
    .bind::<DieselDate, _>(date)
    .get_result::<CountResult>(conn)?;

    Ok(result.cnt)
}

/// Count transition events whose payload landed on the given status.
fn count_transitions_to(
    conn: &mut diesel::pg::PgConnection,
    date: NaiveDate,
    event_type: &str,
    status: &str,
) -> anyhow::Result<i64> {
    let result = diesel::sql_query(
        "SELECT COUNT(*) AS cnt \
         FROM analytics_events \
         WHERE event_type = $1 \
         AND properties->'data'->>'status' = $2 \
         AND created_at >= $3::date \
         AND created_at < ($3::date + INTERVAL '1 day')",
    )
    .bind::<Text, _>(event_type)
    .bind::<Text, _>(status)
    .bind::<DieselDate, _>(date)
    .get_result::<CountResult>(conn)?;

    Ok(result.cnt)
}

fn count_moderation_actions(conn: &mut diesel::pg::PgConnection, date: NaiveDate) -> anyhow::Result<i64> {
    let result = diesel::sql_query(
        "SELECT COUNT(*) AS cnt \
         FROM analytics_events \
         WHERE event_type LIKE 'skillshikhi.moderation.user.%' \
         AND created_at >= $1::date \
         AND created_at < ($1::date + INTERVAL '1 day')",
    )
    .bind::<DieselDate, _>(date)
    .get_result::<CountResult>(conn)?;

    Ok(result.cnt)
}

fn top_active_users(
    conn: &mut diesel::pg::PgConnection,
    date: NaiveDate,
) -> anyhow::Result<serde_json::Value> {
    let rows = diesel::sql_query(
        "SELECT user_id::text AS id, COUNT(*) AS cnt \
         FROM analytics_events \
         WHERE user_id IS NOT NULL \
         AND created_at >= $1::date \
         AND created_at < ($1::date + INTERVAL '1 day') \
         GROUP BY user_id \
         ORDER BY cnt DESC \
         LIMIT 5",
    )
    .bind::<DieselDate, _>(date)
    .load::<TopEntry>(conn)?;

    Ok(top_entries_json(rows, "events"))
}

fn top_reported_users(
    conn: &mut diesel::pg::PgConnection,
    date: NaiveDate,
) -> anyhow::Result<serde_json::Value> {
    let rows = diesel::sql_query(
        "SELECT properties->'data'->>'reported_id' AS id, COUNT(*) AS cnt \
         FROM analytics_events \
         WHERE event_type = $1 \
         AND properties->'data'->>'reported_id' IS NOT NULL \
         AND created_at >= $2::date \
         AND created_at < ($2::date + INTERVAL '1 day') \
         GROUP BY 1 \
         ORDER BY cnt DESC \
         LIMIT 5",
    )
    .bind::<Text, _>(routing_keys::MODERATION_REPORT_CREATED)
    .bind::<DieselDate, _>(date)
    .load::<TopEntry>(conn)?;

    Ok(top_entries_json(rows, "reports"))
}

fn top_entries_json(rows: Vec<TopEntry>, count_key: &str) -> serde_json::Value {
    serde_json::Value::Array(
        rows.into_iter()
            .map(|r| serde_json::json!({ "user_id": r.id, count_key: r.cnt }))
            .collect(),
    )
}

/// Spawn a background task that regenerates today's snapshot every hour.
pub fn spawn_aggregation_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));

        loop {
            interval.tick().await;

            let today = Utc::now().date_naive();
            tracing::info!("running hourly snapshot generation");
            match generate_snapshot(&state.db, today) {
                Ok(_) => {
                    tracing::info!("hourly snapshot generation completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "hourly snapshot generation failed");
                }
            }
        }
    });
}
