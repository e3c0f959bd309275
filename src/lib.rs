pub mod admin;
pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::app::tokens::TokenIssuer;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub tokens: TokenIssuer,
    pub admin_token: Option<String>,
}
