//! Application layer: command language and the editing session
//!
//! This layer drives the domain store on behalf of the front end.

pub mod command;
pub mod error;
pub mod services;

pub use command::{Command, Target, HELP};
pub use error::{ApplicationError, ApplicationResult};
