// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library half of the `ezshop` binary, shared by its subcommands and the
//! end-to-end tests.

pub mod runtime;

pub use runtime::Runtime;

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` overrides `level` when set. Output goes to stderr so `ask` can
/// print its reply on stdout.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ezshop={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
