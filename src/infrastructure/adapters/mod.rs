//! Platform adapters implementing the outbound `Bot` trait

pub mod console;
#[cfg(test)]
pub mod recording;
