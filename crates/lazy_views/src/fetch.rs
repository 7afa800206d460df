//! Batched fetch of deferred fragments over the bus.
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::Sender;

use bus::{CoreCommand, CoreEvent};
use core_types::{CacheId, RequestId};

use crate::command::{Command, decode_commands};
use crate::error::LazyViewsError;
use crate::request::BatchRequest;
use crate::settings::Settings;

pub struct FetchCoordinator {
    endpoint: String,
    cmd_tx: Sender<CoreCommand>,
    next_id: RequestId,
    in_flight: HashMap<RequestId, Vec<CacheId>>,
}

impl FetchCoordinator {
    pub fn new(endpoint: impl Into<String>, cmd_tx: Sender<CoreCommand>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cmd_tx,
            next_id: 1,
            in_flight: HashMap::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one POST for `ids`. An empty batch sends nothing and returns `None`.
    pub fn request(
        &mut self,
        ids: Vec<CacheId>,
        query: BTreeMap<String, String>,
        settings: &Settings,
    ) -> Result<Option<RequestId>, LazyViewsError> {
        let Some(batch) = BatchRequest::new(ids, query, settings) else {
            log::trace!(target: "lazy_views.fetch", "empty batch, nothing to send");
            return Ok(None);
        };

        let request_id = self.next_id;
        self.next_id += 1;
        log::debug!(
            target: "lazy_views.fetch",
            "request {request_id}: {} id(s) to {}",
            batch.ids.len(),
            self.endpoint
        );
        self.cmd_tx
            .send(CoreCommand::PostBatch {
                request_id,
                url: self.endpoint.clone(),
                form: batch.to_form(),
            })
            .map_err(|_| LazyViewsError::BusClosed)?;
        self.in_flight.insert(request_id, batch.ids);
        Ok(Some(request_id))
    }

    /// Correlates a network event with its request and decodes the command list.
    pub fn complete(
        &mut self,
        event: CoreEvent,
    ) -> Result<(RequestId, Vec<Command>), LazyViewsError> {
        let request_id = event.request_id();
        let ids = self
            .in_flight
            .remove(&request_id)
            .ok_or(LazyViewsError::UnknownRequest(request_id))?;

        match event {
            CoreEvent::BatchResponse { status, body, .. } => {
                let commands = decode_commands(&body)
                    .map_err(|source| LazyViewsError::Decode { request_id, source })?;
                log::debug!(
                    target: "lazy_views.fetch",
                    "request {request_id} ({status}): {} command(s) for {} id(s)",
                    commands.len(),
                    ids.len()
                );
                Ok((request_id, commands))
            }
            CoreEvent::BatchFailed { error, .. } => Err(LazyViewsError::Network {
                request_id,
                message: error,
            }),
        }
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_ids(&self, request_id: RequestId) -> Option<&[CacheId]> {
        self.in_flight.get(&request_id).map(Vec::as_slice)
    }
}
