pub mod config;
pub mod gfswave_parser;
pub mod ndbc_parser;
pub mod units;
