pub mod system;

pub use system::*;
