pub mod advanced;
pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod export;
pub mod output;
pub mod render;
pub mod session;
pub mod stats;
pub mod tags;
pub mod utils;

#[cfg(test)]
mod tests;
