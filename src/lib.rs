// Library exports for kubeterm
// This allows the test suite to import modules

pub mod chat;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod event_handler;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod surface;
pub mod ui;
