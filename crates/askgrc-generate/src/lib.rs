#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chain;
pub mod confidence;
pub mod prompts;

pub use chain::{ChainOutcome, ProviderChain};
