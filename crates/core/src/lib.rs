//! Core library for the assistant relay
//!
//! This crate contains the domain types shared by every layer:
//! - Conversation messages, entries and run states
//! - Attachments and the on-disk attachment store

pub mod attachment;
pub mod conversation;
pub mod error;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
