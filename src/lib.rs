//! Core of the quizr test runner: the session state machine, its question
//! sources and result stores. The terminal front end lives in the binary.

pub mod config;
pub mod error;
pub mod session;
pub mod source;
pub mod store;
pub mod wizard;
