//! Completion chime playback surface.
//!
//! Audio output objects are not `Send`, so playback lives on a dedicated
//! thread that is provisioned lazily on the first chime and reused for
//! every one after. Playback failure is logged and otherwise silent.
//!
//! Built without the `chime` feature, the surface falls back to the
//! terminal bell so the dispatch path stays identical.

use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use tracing::warn;

pub struct Chime {
    tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl Chime {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    /// Request one chime. Best-effort.
    pub fn ring(&self) {
        match self.ensure_thread() {
            Ok(tx) => {
                let _ = tx.send(());
            }
            Err(e) => warn!(target: "pomodorino::chime", "chime unavailable: {e}"),
        }
    }

    fn ensure_thread(&self) -> Result<mpsc::Sender<()>, String> {
        let mut slot = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = slot.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<()>();
        thread::Builder::new()
            .name("chime".to_string())
            .spawn(move || playback_loop(rx))
            .map_err(|e| e.to_string())?;
        *slot = Some(tx.clone());
        Ok(tx)
    }
}

#[cfg(feature = "chime")]
fn playback_loop(rx: mpsc::Receiver<()>) {
    use std::time::Duration;

    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, OutputStreamHandle};

    // The stream must outlive every chime; both live on this thread only.
    let mut stream: Option<(OutputStream, OutputStreamHandle)> = None;

    while rx.recv().is_ok() {
        if stream.is_none() {
            match OutputStream::try_default() {
                Ok(pair) => stream = Some(pair),
                Err(e) => {
                    warn!(target: "pomodorino::chime", "no audio output: {e}");
                    continue;
                }
            }
        }
        if let Some((_, handle)) = &stream {
            let ding = SineWave::new(880.0)
                .take_duration(Duration::from_millis(300))
                .amplify(0.55);
            if let Err(e) = handle.play_raw(ding) {
                warn!(target: "pomodorino::chime", "playback failed: {e}");
            }
        }
    }
}

#[cfg(not(feature = "chime"))]
fn playback_loop(rx: mpsc::Receiver<()>) {
    use std::io::Write;

    while rx.recv().is_ok() {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}
