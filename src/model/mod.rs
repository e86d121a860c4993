pub mod builtin;
pub mod catalog;
pub mod config;
pub mod loader;
pub mod song;
