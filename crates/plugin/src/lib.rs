//! renderhook Plugin - C ABI Layer
//!
//! This crate compiles to a cdylib that exposes one process-wide
//! [`Session`] to native callers. The session is created on first use from
//! the loaded [`SessionConfig`], which is also when logging is set up.

pub mod ffi;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use renderhook_core::{Session, SessionConfig};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "RENDERHOOK_LOG";

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

/// Lock the process-wide session, creating it on first use
pub(crate) fn session() -> MappedMutexGuard<'static, Session> {
    MutexGuard::map(SESSION.lock(), |slot| slot.get_or_insert_with(create_session))
}

/// Lock the process-wide session only if it was already created
pub(crate) fn existing_session() -> Option<MappedMutexGuard<'static, Session>> {
    MutexGuard::try_map(SESSION.lock(), |slot| slot.as_mut()).ok()
}

fn create_session() -> Session {
    let loaded = SessionConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    init_logging(&config);

    if let Err(e) = &loaded {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }

    let session = Session::from_config(&config);
    tracing::info!(
        "renderhook {} ready ({} backends available)",
        env!("CARGO_PKG_VERSION"),
        session.available_backends().backends().count()
    );
    session
}

/// Install the fmt subscriber unless the host already installed one
fn init_logging(config: &SessionConfig) {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
