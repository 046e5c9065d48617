pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fallback;
pub mod feeds;
pub mod net;
pub mod providers;
pub mod services;
pub mod storage;
pub mod utils;
