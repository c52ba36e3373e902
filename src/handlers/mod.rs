pub mod admin;
pub mod analysis;
pub mod health;
pub mod problems;

pub use admin::*;
pub use analysis::*;
pub use health::*;
pub use problems::*;
