//! Storefront core for a delivery-order digital menu.
//!
//! Customers identify themselves by phone, build a cart from the store's
//! catalog, and place orders; operators drive each order through its
//! lifecycle and settle the customer and driver payment axes. All state
//! is per-store JSON documents in a local SQLite file.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod assist;
pub mod cart;
pub mod clients;
pub mod db;
mod error;
pub mod events;
pub mod fees;
pub mod menu;
pub mod models;
pub mod orders;
pub mod session;
pub mod settings;
pub mod storage;

pub use error::{Error, Result};

/// Initialize structured logging (console + rolling file).
///
/// Honors `RUST_LOG` when set; otherwise logs the crate at debug and
/// everything else at info.
pub fn init_tracing(log_dir: &Path) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,digital_menu_pos=debug"));

    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "storefront");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the process; dropping it
    // flushes and stops the file writer.
    std::mem::forget(guard);

    info!("Storefront core v{} logging initialized", env!("CARGO_PKG_VERSION"));
}
