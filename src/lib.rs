pub mod browser;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod error;
pub mod preview;
pub mod session;
pub mod storage;
pub mod web;
