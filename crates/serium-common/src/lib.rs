pub mod config;

pub type Result<T> = anyhow::Result<T>;
