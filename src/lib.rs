pub mod error;
pub mod export;
pub mod locate;
pub mod map;
