pub mod batch;
pub mod config;
pub mod error;
pub mod ident;
pub mod io;
pub mod model;
pub mod update;
pub mod validate;

pub use error::{Result, ToolError};
