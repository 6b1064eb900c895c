pub mod constants;
pub mod time;
pub mod units;
