//! Data models shared by the accessor, the composer and the routes.

mod github;
mod site;

pub use github::*;
pub use site::*;
