//! Desktop notifier: system notifications plus the completion chime.

use pomodorino_core::Notifier;
use tracing::warn;

use crate::chime::Chime;

pub struct DesktopNotifier {
    chime: Chime,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            chime: Chime::new(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn alert(&self, message: &str) {
        println!("{message}");
        if let Err(e) = notify_rust::Notification::new()
            .summary("Pomodoro Timer")
            .body(message)
            .timeout(notify_rust::Timeout::Milliseconds(5000))
            .show()
        {
            warn!(target: "pomodorino::notify", "could not send notification: {e}");
        }
    }

    fn play_sound(&self) {
        self.chime.ring();
    }
}
