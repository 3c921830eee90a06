pub mod emulator;
pub mod mqtt;
pub mod payload;
pub mod sensor;
pub mod topic;
