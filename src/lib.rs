pub mod aggregate;
pub mod client;
pub mod config;
pub mod converter;
pub mod downloader;
pub mod entity;
pub mod error;
pub mod journal;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod util;

pub use client::{Client, Fetcher};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{run, Outcome, Summary};
