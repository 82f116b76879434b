pub mod app;
pub mod archive;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod error;
pub mod night;
pub mod parse;
pub mod reconcile;
pub mod report;
pub mod station;
pub mod transfer;
pub mod util;

pub use error::AutocamsError;
