pub mod address;
pub mod artifacts;
pub mod checkpoint;
pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod testing;

#[cfg(test)]
mod tests;
