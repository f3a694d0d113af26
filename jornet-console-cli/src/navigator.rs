//! Router for the terminal shell.
//!
//! Navigations requested by the console (including deferred guard redirects
//! fired from a background task) are forwarded over a channel and handled by
//! the shell loop.

use jornet_console_core::{Navigation, Navigator};
use tokio::sync::mpsc;
use tracing::debug;

pub struct TerminalNavigator {
    tx: mpsc::UnboundedSender<Navigation>,
}

impl TerminalNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, target: Navigation) {
        debug!(path = target.path(), "Navigation requested");
        // The shell is gone once the receiver is dropped.
        let _ = self.tx.send(target);
    }
}
