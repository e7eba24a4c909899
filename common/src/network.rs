pub mod candidate;
pub mod interface;
pub mod mac;
