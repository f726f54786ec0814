//! OS termination signal registration.

use aiff_capture_core::models::error::CaptureError;
use aiff_capture_core::session::coordinator::SignalFlag;

/// Signals that request a shutdown. SIGINT, SIGTERM and SIGHUP go through
/// ctrlc's `termination` set; SIGQUIT is registered separately on unix.
pub const SHUTDOWN_SIGNALS: &[&str] = &["SIGINT", "SIGTERM", "SIGHUP", "SIGQUIT"];

/// Route the shutdown signals to `flag`.
///
/// Can only be called once per process.
pub fn register_shutdown_signals(flag: SignalFlag) -> Result<(), CaptureError> {
    register_quit_signal(&flag)?;

    ctrlc::set_handler(move || {
        if flag.is_raised() {
            log::warn!("already shutting down");
        } else {
            log::info!("received shutdown signal");
            flag.raise();
        }
    })
    .map_err(|e| CaptureError::SignalRegistration(e.to_string()))?;

    log::debug!("watching {}", SHUTDOWN_SIGNALS.join(", "));
    Ok(())
}

/// SIGQUIT would otherwise dump core and skip the header patch.
#[cfg(unix)]
fn register_quit_signal(flag: &SignalFlag) -> Result<(), CaptureError> {
    signal_hook::flag::register(signal_hook::consts::SIGQUIT, flag.as_atomic())
        .map(|_| ())
        .map_err(|e| CaptureError::SignalRegistration(format!("SIGQUIT: {}", e)))
}

#[cfg(not(unix))]
fn register_quit_signal(_flag: &SignalFlag) -> Result<(), CaptureError> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn quit_signal_raises_flag() {
        let flag = SignalFlag::default();
        register_quit_signal(&flag).unwrap();
        assert!(!flag.is_raised());

        signal_hook::low_level::raise(signal_hook::consts::SIGQUIT).unwrap();
        assert!(flag.is_raised());
    }

    #[test]
    fn shutdown_set_includes_quit() {
        for name in ["SIGINT", "SIGTERM", "SIGHUP", "SIGQUIT"] {
            assert!(SHUTDOWN_SIGNALS.contains(&name), "{} missing", name);
        }
    }
}
