pub mod auth;
pub mod comic;
