use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    // Downstream service URLs
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_user_url")]
    pub user_url: String,
    #[serde(default = "default_session_url")]
    pub session_url: String,
    #[serde(default = "default_messaging_url")]
    pub messaging_url: String,
    #[serde(default = "default_notification_url")]
    pub notification_url: String,
    #[serde(default = "default_moderation_url")]
    pub moderation_url: String,
    #[serde(default = "default_analytics_url")]
    pub analytics_url: String,

    // Rate limits
    #[serde(default = "default_user_rpm")]
    pub user_rpm: u64,
    #[serde(default = "default_user_rph")]
    pub user_rph: u64,
    #[serde(default = "default_admin_rpm")]
    pub admin_rpm: u64,
    #[serde(default = "default_admin_rph")]
    pub admin_rph: u64,
}

fn default_port() -> u16 { 4000 }
fn default_jwt_secret() -> String { "development-secret-change-in-production".into() }
fn default_redis_url() -> String { "redis://localhost:6379".into() }
fn default_auth_url() -> String { "http://localhost:4001".into() }
fn default_user_url() -> String { "http://localhost:4002".into() }
fn default_session_url() -> String { "http://localhost:4003".into() }
fn default_messaging_url() -> String { "http://localhost:4004".into() }
fn default_notification_url() -> String { "http://localhost:4005".into() }
fn default_moderation_url() -> String { "http://localhost:4006".into() }
fn default_analytics_url() -> String { "http://localhost:4007".into() }
fn default_user_rpm() -> u64 { 60 }
fn default_user_rph() -> u64 { 600 }
fn default_admin_rpm() -> u64 { 300 }
fn default_admin_rph() -> u64 { 3000 }

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SKILLSHIKHI_GATEWAY").separator("__"))
            .build()?;
        Ok(config.try_deserialize().unwrap_or_else(|_| Self {
            port: default_port(),
            jwt_secret: default_jwt_secret(),
            redis_url: default_redis_url(),
            auth_url: default_auth_url(),
            user_url: default_user_url(),
            session_url: default_session_url(),
            messaging_url: default_messaging_url(),
            notification_url: default_notification_url(),
            moderation_url: default_moderation_url(),
            analytics_url: default_analytics_url(),
            user_rpm: default_user_rpm(),
            user_rph: default_user_rph(),
            admin_rpm: default_admin_rpm(),
            admin_rph: default_admin_rph(),
        }))
    }

    /// Resolve the upstream service base URL from the incoming request path.
    ///
    /// `/api/admin/*` splits by section: login and device sessions belong to
    /// the auth service, analytics to the analytics service, everything else
    /// (reports, users, audit-log) to moderation.
    pub fn resolve_upstream(&self, path: &str) -> Option<&str> {
        if path.starts_with("/api/admin/login") {
            Some(&self.auth_url)
        } else if path.starts_with("/api/admin/sessions") {
            Some(&self.auth_url)
        } else if path.starts_with("/api/admin/analytics") {
            Some(&self.analytics_url)
        } else if path.starts_with("/api/admin/") || path == "/api/admin" {
            Some(&self.moderation_url)
        } else if path.starts_with("/api/auth/") || path == "/api/auth" {
            Some(&self.auth_url)
        } else if path.starts_with("/api/users/") || path == "/api/users" {
            Some(&self.user_url)
        } else if path.starts_with("/api/friends/") || path == "/api/friends" {
            Some(&self.user_url)
        } else if path.starts_with("/api/sessions/") || path == "/api/sessions" {
            Some(&self.session_url)
        } else if path.starts_with("/api/messages/") || path == "/api/messages" {
            Some(&self.messaging_url)
        } else if path.starts_with("/api/notifications/") || path == "/api/notifications" {
            Some(&self.notification_url)
        } else if path.starts_with("/api/reports/") || path == "/api/reports" {
            Some(&self.moderation_url)
        } else {
            None
        }
    }
}
