//! Cart backend access.
//!
//! This module provides:
//! - [`CartClient`] for adding, listing, updating and deleting cart lines
//! - [`CartError`], the failure taxonomy callers branch on
//! - [`queries`], typed stored-procedure calls for the generic query endpoint
//!
//! # Flow
//!
//! 1. A guest gets a [`UniqueId`](cartsync_core::UniqueId) (or signs in with a user id)
//! 2. `add_item` creates a line, or bumps its quantity if the item is already there
//! 3. `list_items` re-reads the cart; this is where `CartId`s come from
//! 4. `update_quantity` / `delete_item` act on a `CartId` from step 3

mod client;
mod error;
pub mod queries;
mod types;

pub use client::CartClient;
pub use error::{CartError, NETWORK_FAILURE_CODE};
pub use queries::{CartQuery, QueryArg, StoredProcedure, render_query};
pub use types::{AddStatus, AddedItem};
