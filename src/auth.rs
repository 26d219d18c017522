pub mod hash;
pub mod token;
mod verify_session;

pub use verify_session::{verify_session, Error};
