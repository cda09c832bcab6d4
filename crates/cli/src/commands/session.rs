//! Guest session commands.

use cartsync_core::UniqueId;

/// Print a fresh anonymous session token on stdout.
///
/// The token is printed bare so it can be captured with `$(...)`.
pub fn new_session() {
    let id = UniqueId::generate();
    #[allow(clippy::print_stdout)]
    {
        println!("{id}");
    }
    tracing::debug!(unique_id = %id, "Generated guest session token");
}
