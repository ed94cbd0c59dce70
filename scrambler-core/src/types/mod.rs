pub mod keys;
pub mod transition;

pub use keys::*;
pub use transition::*;
