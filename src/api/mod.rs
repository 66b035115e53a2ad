pub mod health;
pub mod interactions;

pub use health::health;
