#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod crawl;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod harvest;
pub mod html;
pub mod logging;
pub mod raw_store;
pub mod store;
