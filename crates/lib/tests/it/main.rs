/*! Integration tests for Ancestry.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - store: Tests for the in-memory document store and its persistence
 * - tree: Tests for the Tree façade, organized by concern (id allocation,
 *   relationship queries, move cascades, orphan strategies, integrity)
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ancestry=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod store;
