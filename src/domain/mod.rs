pub mod engagement;
pub mod notification;
pub mod post;
pub mod saved;
pub mod user;
