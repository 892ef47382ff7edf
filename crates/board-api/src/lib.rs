pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod ownership;
pub mod password;
pub mod posts;
pub mod routes;
pub mod rows;
pub mod state;
pub mod token;
pub mod validation;

pub use routes::router;
pub use state::{AppState, AppStateInner};
