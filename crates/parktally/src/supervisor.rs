//! Process-boundary supervision.
//!
//! Unexpected failures (panics) inside a unit of work are caught here,
//! followed by one best-effort snapshot write, and the process keeps
//! running. Only an interrupt or terminate signal ends a resident process,
//! and both go through [`finish`] for a final save first.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, info, warn};

use crate::registry::LocationRegistry;

/// A termination signal the process honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Ctrl+C / SIGINT.
    Interrupt,
    /// SIGTERM from a service manager.
    Terminate,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Why a resident session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A termination signal arrived.
    Signal(ShutdownSignal),
    /// The input stream closed.
    EndOfInput,
    /// The operator asked to quit.
    Quit,
}

impl std::fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "received {signal}"),
            Self::EndOfInput => write!(f, "end of input"),
            Self::Quit => write!(f, "quit requested"),
        }
    }
}

/// Run `f` against the registry, absorbing any panic.
///
/// On panic the failure is logged, the registry is saved once, and `None`
/// is returned so the caller can carry on.
pub fn supervise<T, F>(registry: &mut LocationRegistry, operation: &str, f: F) -> Option<T>
where
    F: FnOnce(&mut LocationRegistry) -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(registry))) {
        Ok(value) => Some(value),
        Err(payload) => {
            error!(
                "Unexpected failure during {}: {}",
                operation,
                panic_message(payload.as_ref())
            );
            registry.save_data();
            None
        }
    }
}

/// End a session: log why, then save once.
pub fn finish(registry: &LocationRegistry, reason: SessionEnd) {
    info!("Session ending ({}), saving data", reason);
    registry.save_data();
}

/// Route panic reports through tracing instead of raw stderr.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        error!("panic at {}: {}", location, panic_message(info.payload()));
    }));
}

/// Wait for an interrupt or terminate signal.
pub async fn shutdown_signal() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            warn!("Cannot listen for Ctrl+C: {}", e);
                            terminate.recv().await;
                            return ShutdownSignal::Terminate;
                        }
                        ShutdownSignal::Interrupt
                    }
                    _ = terminate.recv() => ShutdownSignal::Terminate,
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                wait_for_interrupt().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_interrupt().await
    }
}

async fn wait_for_interrupt() -> ShutdownSignal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    ShutdownSignal::Interrupt
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::storage::MemoryStore;

    #[test]
    fn test_supervise_returns_value() {
        let mut registry = LocationRegistry::new(MemoryStore::new());
        let result = supervise(&mut registry, "add", |r| {
            r.add_location("Bugis", 50).map(|record| record.total_parking_lots)
        });
        assert_eq!(result.unwrap().unwrap(), 50);
    }

    #[test]
    fn test_supervise_passes_errors_through() {
        let mut registry = LocationRegistry::new(MemoryStore::new());
        let result = supervise(&mut registry, "update", |r| {
            r.update_location("Nowhere", 1, 0).map(|_| ())
        });
        assert!(result.unwrap().unwrap_err().is_location_not_found());
    }

    #[test]
    fn test_supervise_absorbs_panic_and_saves() {
        init_test_logging();
        let store = MemoryStore::new();
        let mut registry = LocationRegistry::new(store.clone());

        let result: Option<()> = supervise(&mut registry, "explode", |_| panic!("boom"));

        assert!(result.is_none());
        assert_eq!(store.document().as_deref(), Some("{}"));
    }

    #[test]
    fn test_supervise_keeps_working_after_panic() {
        init_test_logging();
        let mut registry = LocationRegistry::new(MemoryStore::new());
        registry.add_location("Bugis", 50).unwrap();

        let _: Option<()> = supervise(&mut registry, "explode", |r| {
            r.update_location("Bugis", 5, 0).unwrap();
            panic!("after the update");
        });
        let available = supervise(&mut registry, "query", |r| r.get_available_lots("Bugis"));

        assert_eq!(available, Some(Some(45)));
    }

    #[test]
    fn test_finish_saves() {
        let store = MemoryStore::new();
        let registry = LocationRegistry::new(store.clone());

        finish(&registry, SessionEnd::Signal(ShutdownSignal::Terminate));
        assert_eq!(store.document().as_deref(), Some("{}"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_display() {
        assert_eq!(ShutdownSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(ShutdownSignal::Terminate.to_string(), "SIGTERM");
        assert_eq!(
            SessionEnd::Signal(ShutdownSignal::Interrupt).to_string(),
            "received SIGINT"
        );
        assert_eq!(SessionEnd::EndOfInput.to_string(), "end of input");
        assert_eq!(SessionEnd::Quit.to_string(), "quit requested");
    }
}
