//! Wire types shared by the board API and its clients.

pub mod api;
pub mod models;
