pub mod admin_login;
pub mod forgot_password;
pub mod health;
pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;
pub mod register;
pub mod reset_password;
pub mod sessions;
pub mod validate_reset_token;
