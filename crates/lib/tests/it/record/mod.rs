//! Record engine tests
//!
//! These drive records through a `GatedRemote` so settlement order, failures and timing are
//! chosen by the test.

mod observers;
mod timeouts;
