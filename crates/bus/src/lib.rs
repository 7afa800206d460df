use core_types::RequestId;
use net::FormBody;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug)]
pub enum CoreCommand {
    // UI -> network
    PostBatch {
        request_id: RequestId,
        url: String,
        form: FormBody,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum CoreEvent {
    // Network -> UI
    BatchResponse {
        request_id: RequestId,
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    BatchFailed {
        request_id: RequestId,
        url: String,
        error: String,
    },
}

impl CoreEvent {
    pub fn request_id(&self) -> RequestId {
        match self {
            CoreEvent::BatchResponse { request_id, .. } | CoreEvent::BatchFailed { request_id, .. } => {
                *request_id
            }
        }
    }
}

/// UI-side ends of the channels, plus the runtime-side ends to hand to `runtime_net`.
pub struct Bus {
    pub cmd_tx: Sender<CoreCommand>,
    pub evt_rx: Receiver<CoreEvent>,
    pub evt_tx: Sender<CoreEvent>, // shareable for runtimes
}

impl Bus {
    /// Creates the bus and returns the command receiver the network runtime drains.
    pub fn new() -> (Self, Receiver<CoreCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        (
            Self {
                cmd_tx,
                evt_rx,
                evt_tx,
            },
            cmd_rx,
        )
    }
}
