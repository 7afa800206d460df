use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use bus::{CoreCommand, CoreEvent};
use net::Transport;

/// Runs batch posts off the UI thread until `Shutdown` or until every sender is gone.
///
/// Each post gets its own worker so a slow response never holds back a later batch.
pub fn start_net_runtime(
    cmd_rx: Receiver<CoreCommand>,
    evt_tx: Sender<CoreEvent>,
    transport: Arc<dyn Transport>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                CoreCommand::PostBatch {
                    request_id,
                    url,
                    form,
                } => {
                    let transport = Arc::clone(&transport);
                    let evt_tx = evt_tx.clone();
                    thread::spawn(move || {
                        let event = match transport.post_form(&url, &form) {
                            Ok(response) => CoreEvent::BatchResponse {
                                request_id,
                                status: response.status,
                                content_type: response.content_type,
                                body: response.body,
                            },
                            Err(err) => {
                                log::warn!(target: "runtime_net", "batch {request_id} failed: {err}");
                                CoreEvent::BatchFailed {
                                    request_id,
                                    url,
                                    error: err.to_string(),
                                }
                            }
                        };
                        // The UI may already be gone; nothing left to report to.
                        let _ = evt_tx.send(event);
                    });
                }
                CoreCommand::Shutdown => break,
            }
        }
        log::debug!(target: "runtime_net", "network runtime stopped");
    })
}
