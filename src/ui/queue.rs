use crate::errors::PeerError;
use crate::ui::{ui_thread_callback, UiMessage, UiSurface};
use crossbeam_channel::{Receiver, Sender};
use std::thread::JoinHandle;

enum Envelope {
    Message(UiMessage),
    Shutdown,
}

/// Create the cross-thread UI queue.
pub fn ui_queue() -> (UiDispatcher, UiReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (UiDispatcher { tx }, UiReceiver { rx })
}

/// Sending half of the UI queue. Cheap to clone, never blocks.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: Sender<Envelope>,
}

impl UiDispatcher {
    pub fn queue_ui_callback(&self, message: UiMessage) -> Result<(), PeerError> {
        self.tx
            .send(Envelope::Message(message))
            .map_err(|_| PeerError::UiError("UI thread is gone".to_string()))
    }

    fn shutdown(&self) -> Result<(), PeerError> {
        self.tx
            .send(Envelope::Shutdown)
            .map_err(|_| PeerError::UiError("UI thread is gone".to_string()))
    }
}

/// Receiving half of the UI queue; lives on the UI thread.
pub struct UiReceiver {
    rx: Receiver<Envelope>,
}

impl UiReceiver {
    /// Messages queued and not yet handled.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Handle everything currently queued without waiting for more.
    pub fn dispatch_pending(&self, surface: &mut dyn UiSurface) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            match envelope {
                Envelope::Message(message) => {
                    ui_thread_callback(surface, message);
                    handled += 1;
                }
                Envelope::Shutdown => break,
            }
        }
        handled
    }

    /// Handle messages until shutdown is requested or every dispatcher is dropped.
    pub fn run(self, surface: &mut dyn UiSurface) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.rx.recv() {
            match envelope {
                Envelope::Message(message) => {
                    ui_thread_callback(surface, message);
                    handled += 1;
                }
                Envelope::Shutdown => break,
            }
        }
        handled
    }
}

/// Dedicated thread that owns the UI surface.
pub struct UiThread {
    control: UiDispatcher,
    handle: JoinHandle<usize>,
}

impl UiThread {
    /// Spawn the UI thread. The surface is built by `factory` on that
    /// thread, so it never has to cross threads itself.
    pub fn spawn<F, S>(factory: F) -> Result<(Self, UiDispatcher), PeerError>
    where
        F: FnOnce() -> S + Send + 'static,
        S: UiSurface + 'static,
    {
        let (dispatcher, receiver) = ui_queue();
        let handle = std::thread::Builder::new()
            .name("peerpair-ui".to_string())
            .spawn(move || {
                let mut surface = factory();
                log::debug!("UI thread started");
                let handled = receiver.run(&mut surface);
                log::debug!("UI thread finished after {} messages", handled);
                handled
            })
            .map_err(|e| PeerError::UiError(format!("Failed to spawn UI thread: {}", e)))?;

        Ok((
            Self {
                control: dispatcher.clone(),
                handle,
            },
            dispatcher,
        ))
    }

    /// Stop the UI thread after it drains what was queued before this call.
    pub fn shutdown(self) -> Result<usize, PeerError> {
        self.control.shutdown()?;
        self.handle
            .join()
            .map_err(|_| PeerError::UiError("UI thread panicked".to_string()))
    }
}
