//! Transport double that replays a script and records every request.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    ChannelTransport, OutboundRequest, TransportError, TransportResponse,
};

type Hook = Box<dyn FnOnce() + Send>;

struct Step {
    result: Result<TransportResponse, TransportError>,
    hook: Option<Hook>,
}

/// Replays queued results in order. Once the script runs dry every call
/// fails with `InvalidRequest`, which is terminal and never retried.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    /// Queue a response with `status` and `body`.
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.push(Ok(TransportResponse::new(status, body)), None)
    }

    /// Queue a transport failure.
    pub fn fail(&self, error: TransportError) -> &Self {
        self.push(Err(error), None)
    }

    /// Queue a response and run `hook` once it has been recorded, before
    /// the caller sees it.
    pub fn respond_then(
        &self,
        status: u16,
        body: &str,
        hook: impl FnOnce() + Send + 'static,
    ) -> &Self {
        self.push(Ok(TransportResponse::new(status, body)), Some(Box::new(hook)))
    }

    fn push(&self, result: Result<TransportResponse, TransportError>, hook: Option<Hook>) -> &Self {
        lock(&self.script, "script").push_back(Step { result, hook });
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<OutboundRequest> {
        lock(&self.requests, "requests").clone()
    }

    /// Number of requests sent to `host`.
    pub fn calls_to(&self, host: &str) -> usize {
        lock(&self.requests, "requests")
            .iter()
            .filter(|request| request.url.host_str() == Some(host))
            .count()
    }

    /// Number of queued steps not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.script, "script").len()
    }
}

#[async_trait]
impl ChannelTransport for ScriptedTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        lock(&self.requests, "requests").push(request.clone());
        let step = lock(&self.script, "script").pop_front();
        match step {
            Some(Step { result, hook }) => {
                if let Some(hook) = hook {
                    hook();
                }
                result
            }
            None => Err(TransportError::invalid_request(format!(
                "no scripted response for {}",
                request.url
            ))),
        }
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex"),
    }
}
