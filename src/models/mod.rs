pub mod card;
pub mod deck;
pub mod failure;

pub use card::*;
pub use deck::*;
pub use failure::*;
