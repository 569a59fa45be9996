//! Business logic services

pub mod session;
pub mod user;

pub use session::SessionService;
pub use user::{LoginOutcome, UserService};
