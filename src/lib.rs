pub mod catalog;
pub mod cli;
pub mod config;
pub mod data_types;
pub mod handler;
pub mod source;
pub mod translate;

#[cfg(test)]
pub(crate) mod testutils;
