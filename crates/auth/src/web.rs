mod api;
mod error;
mod router;
pub mod server;
pub mod state;

pub use error::AuthResult;
pub use router::auth_app;
pub use server::{start_server, ServerHandle};
