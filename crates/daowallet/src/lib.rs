pub mod config;
pub mod wallet;
