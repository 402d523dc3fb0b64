/*! Integration tests for Objectbase.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - record: Tests for the write barrier, read gating and settlement ordering
 * - accessor: Tests for the field-level read/write/sync contract
 * - table: Tests for selecting and inserting rows through a Table
 * - remote: Tests for the RemoteStore implementations
 */

use objectbase::constants::DEFAULT_LOG_DIRECTIVE;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod accessor;
mod record;
mod remote;
mod table;
