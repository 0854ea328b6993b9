// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema migrations embedded at build time with refinery.

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Applies pending migrations and returns how many ran.
///
/// Applied versions are tracked in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, String> {
    embedded::migrations::runner()
        .run(conn)
        .map(|report| report.applied_migrations().len())
        .map_err(|e| format!("migration failed: {e}"))
}
