use std::io::Read;
use std::time::{Duration, Instant};

use crate::form::FormBody;
use crate::{HttpResponse, NetError};

/// Upper bound on a buffered response body.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub trait Transport: Send + Sync {
    /// POSTs `form` to `url` and buffers the whole response.
    ///
    /// Non-2xx statuses are errors.
    fn post_form(&self, url: &str, form: &FormBody) -> Result<HttpResponse, NetError>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn post_form(&self, url: &str, form: &FormBody) -> Result<HttpResponse, NetError> {
        let start = Instant::now();
        let pairs: Vec<(&str, &str)> = form
            .pairs()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        log::debug!(target: "net", "POST {url} ({} fields)", pairs.len());
        let response = self
            .agent
            .post(url)
            .set("Accept", "application/json, text/javascript, */*; q=0.01")
            .set("X-Requested-With", "XMLHttpRequest")
            .send_form(&pairs)
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => NetError::Status {
                    url: url.to_string(),
                    status,
                },
                ureq::Error::Transport(transport) => NetError::Transport {
                    url: url.to_string(),
                    message: transport.to_string(),
                },
            })?;

        let status = response.status();
        let final_url = response.get_url().to_string();
        let content_type = response.header("Content-Type").map(str::to_string);

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_BODY_BYTES as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|source| NetError::Io {
                url: url.to_string(),
                source,
            })?;
        if body.len() > MAX_BODY_BYTES {
            return Err(NetError::TooLarge {
                url: url.to_string(),
                limit: MAX_BODY_BYTES,
            });
        }

        let duration_ms = start.elapsed().as_millis();
        log::debug!(target: "net", "{status} from {final_url}: {} bytes in {duration_ms}ms", body.len());
        Ok(HttpResponse {
            url: final_url,
            status,
            content_type,
            body,
            duration_ms,
        })
    }
}
