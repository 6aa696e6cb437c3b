pub mod collector;
pub mod distributor;
pub mod staking;

#[cfg(test)]
mod tests;
