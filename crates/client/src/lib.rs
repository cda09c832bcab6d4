//! cartsync Client - HTTP access to the stored-procedure cart backend.
//!
//! # Architecture
//!
//! - Writes go to per-action endpoints (`/AddToCart`, `/UpdateCartQty`,
//!   `/DeleteCartItem`)
//! - Reads go through a single generic query endpoint (`/getData_JSON`) that
//!   executes a stored-procedure call string built by [`cart::queries`]
//! - Every response is decoded once at the network boundary into a typed
//!   outcome or a [`CartError`]
//! - One request per operation, no retries, explicit timeouts
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`cart`] - Cart client, wire types and stored-procedure queries
//! - [`reachability`] - Owned background task that polls backend reachability

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod reachability;

pub use cart::{AddStatus, AddedItem, CartClient, CartError, NETWORK_FAILURE_CODE};
pub use config::{CartConfig, ConfigError, ResponseCodes};
pub use reachability::{
    Clock, FixedClock, HttpProbe, MonitorHandle, Probe, Reachability, ReachabilityMonitor,
    ReachabilityState, SystemClock,
};
