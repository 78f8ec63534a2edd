//! Szókincs: a vocabulary trainer built around spaced repetition.
//!
//! The [`trainer`] module holds the engine (scheduling, review history,
//! daily ledger, gamification, practice sessions, file-backed storage);
//! [`api_server`] exposes it over HTTP for the web client. The `szokincs`
//! binary runs the server, `szokincs-cli` drives the same store from the
//! terminal.

pub mod api_server;
pub mod trainer;
