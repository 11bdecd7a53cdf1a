pub mod cosmos;
pub mod evm;
pub mod move_chain;
