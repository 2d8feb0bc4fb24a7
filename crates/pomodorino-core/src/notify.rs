//! User-facing notifications.
//!
//! The engine fires a notification when a phase completes or the timer is
//! reset. Delivery is best-effort: a missed alert or a failed chime is
//! logged and never surfaces as an error to the countdown path.

/// User-visible alert capability, with an optional completion chime.
///
/// `alert` shows the message; `play_sound` is requested separately and only
/// when the configuration has sound enabled.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
    fn play_sound(&self);
}

/// Notifier that writes to the log. Default for headless use and tests.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::info!(target: "pomodorino::notify", "{message}");
    }

    fn play_sound(&self) {
        tracing::debug!(target: "pomodorino::notify", "chime requested");
    }
}
