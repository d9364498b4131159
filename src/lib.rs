pub mod client;
pub mod config;
pub mod output;
pub mod server;
pub mod store;
pub mod tally;
