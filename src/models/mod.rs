mod admin;
mod common;
mod order;
mod product;
mod user;

pub use admin::*;
pub use common::*;
pub use order::*;
pub use product::*;
pub use user::*;
