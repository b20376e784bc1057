pub mod refresh_token;
pub mod sqlite;
pub mod user;
