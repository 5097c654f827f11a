pub mod admin;
pub mod stations;

pub use admin::*;
pub use stations::*;
