use crate::database::Db;
use crate::token::TokenService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: Db, tokens: TokenService) -> Self {
        AppState { db, tokens }
    }
}
