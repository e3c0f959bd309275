pub mod auth;
pub mod engagement;
pub mod notifications;
pub mod passwords;
pub mod posts;
pub mod saved;
pub mod tokens;
pub mod users;
