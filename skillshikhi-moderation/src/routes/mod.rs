pub mod admin_reports;
pub mod admin_users;
pub mod health;
pub mod user_routes;
