pub mod config;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod playbook;
pub mod script;
pub mod session;
