pub mod health;
pub mod power;
pub mod schedule;
pub mod status;
