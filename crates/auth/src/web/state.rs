use crate::service::{auth::AuthManager, token::TokenManager};

#[derive(Clone)]
pub struct Context<T: TokenManager + Clone> {
    auth: AuthManager<T>,
}

impl<T: TokenManager + Clone> Context<T> {
    pub fn new(auth: AuthManager<T>) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &AuthManager<T> {
        &self.auth
    }
}
