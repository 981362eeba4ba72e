// Public API for integration tests and potential library usage

pub mod api;
pub mod broadcast;
pub mod config;
pub mod display;
pub mod import;
pub mod mailbox;
pub mod observer;
pub mod protocol;
pub mod replica;
pub mod rolling;
pub mod selector;
pub mod state;
pub mod types;
pub mod ws;
