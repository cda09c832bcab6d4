//! cartsync Core - Shared cart domain types.
//!
//! This crate provides the types used across all cartsync components:
//! - `client` - HTTP client for the stored-procedure cart backend
//! - `cli` - Operator tool that drives cart sessions from the shell
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Cart rows
//! are owned by the backend; these types describe what the client sends and
//! what it decodes, nothing more.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for cart IDs, quantities, identities, prices
//!   and line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
