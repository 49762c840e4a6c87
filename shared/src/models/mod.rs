//! Domain models for the B2B marketplace

mod business;
mod catalog;
mod conversation;
mod product;
mod user;

pub use business::*;
pub use catalog::*;
pub use conversation::*;
pub use product::*;
pub use user::*;
