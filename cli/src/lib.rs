pub mod commands;
pub mod config;
pub mod descriptor;
pub mod logging;
pub mod output;
