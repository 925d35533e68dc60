pub mod batch;
pub mod config;
pub mod html;
pub mod server;
pub mod terminal;
