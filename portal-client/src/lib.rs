pub mod api;
pub mod authentication;
pub mod client;
pub mod error;
pub mod files;

#[cfg(test)]
mod testing;
