// src/services/mod.rs
pub mod chatbot;
pub mod metrics_manager;
pub mod preferences;
pub mod providers;
pub mod renderer;
pub mod retry;
pub mod session_loop;
pub mod session_manager;
