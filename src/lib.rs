//! Core library for the modes-locations command line application.
//!
//! The library maintains the location history of objects in a Modes
//! collection export. Accession number handling lives in
//! [`modes::locations::ident`], the record model in [`modes::locations::model`],
//! the history rules in [`modes::locations::validate`] and the mutations in
//! [`modes::locations::update`]. File formats sit under [`modes::locations::io`]
//! and whole-file commands under [`modes::locations::batch`].

pub mod modes;

pub use modes::locations::{
    Result, ToolError, batch, config, error, ident, io, model, update, validate,
};
