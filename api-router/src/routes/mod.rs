pub mod contract;
pub mod health;
