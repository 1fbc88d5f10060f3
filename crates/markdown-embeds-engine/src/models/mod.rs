pub mod embed;
pub mod message;

pub use embed::*;
pub use message::*;
