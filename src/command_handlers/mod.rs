pub mod config_cmd;
pub mod dispatch;
pub mod events;
pub mod issues;
pub mod projects;
pub mod traces;
