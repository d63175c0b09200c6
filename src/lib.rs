//! Comic Diary AI Server
//!
//! Turns diary entries into four-panel comics: a generation request is
//! accepted immediately, then a background pipeline builds a prompt, calls
//! an image generation API, re-hosts the image in S3-compatible storage and
//! records the comic in PostgreSQL. Clients poll for completion.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
