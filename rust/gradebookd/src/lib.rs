//! Grade computation engine and the `gradebookd` sidecar around it.
//!
//! [`calc`] holds the pure engine; [`records`] converts caller-supplied rows
//! into engine types; [`ipc`] exposes both over a line-delimited JSON
//! protocol on stdin/stdout.

pub mod calc;
pub mod config;
pub mod db;
pub mod ipc;
pub mod logging;
pub mod records;
pub mod ui_state;
