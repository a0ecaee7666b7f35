pub mod aggregates;
pub mod farm;
pub mod macros;
pub mod time;

pub use aggregates::*;
pub use farm::*;
pub use time::*;
