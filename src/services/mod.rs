pub mod auth;
pub mod image_gen;
pub mod orchestrator;
pub mod prompt;
pub mod storage;
pub mod task_store;
