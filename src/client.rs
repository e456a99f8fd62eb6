use crate::error::{Error, Result};
use std::io::Read;
use std::time::Duration;

pub trait Fetcher {
    /// GET `url` and return the whole body; non-2xx statuses are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct Client {
    agent: ureq::Agent,
}

impl Client {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Client { agent }
    }
}

impl Fetcher for Client {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);
        let resp = self.agent.get(url).call().map_err(|e| Error::network(url, e))?;

        let mut body = Vec::new();
        resp.into_reader()
            .read_to_end(&mut body)
            .map_err(|source| Error::Body {
                url: url.to_string(),
                source,
            })?;
        log::debug!("{} bytes from {}", body.len(), url);
        Ok(body)
    }
}
