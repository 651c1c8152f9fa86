#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use sports_aggregator::{RetryPolicy, TransportError};

type Reply = Result<String, TransportError>;

/// In-memory transport answering per host from a script.
///
/// Scripted replies are consumed in order; once a host's script is empty its
/// `otherwise` reply repeats. Unknown hosts get a network error.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    otherwise: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once(self, host: &str, reply: Reply) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn always(self, host: &str, reply: Reply) -> Self {
        self.otherwise.lock().unwrap().insert(host.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, host: &str) -> usize {
        self.calls()
            .iter()
            .filter(|u| u.host_str() == Some(host))
            .count()
    }
}

#[async_trait]
impl sports_aggregator::Transport for ScriptedTransport {
    async fn get(&self, url: &Url, _headers: &[(String, String)]) -> Result<String, TransportError> {
        self.calls.lock().unwrap().push(url.clone());
        let host = url.host_str().unwrap_or_default().to_string();

        if let Some(reply) = self.scripts.lock().unwrap().get_mut(&host).and_then(VecDeque::pop_front) {
            return reply;
        }
        self.otherwise
            .lock()
            .unwrap()
            .get(&host)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Network(format!("no route to {}", host))))
    }
}

pub fn server_error() -> Reply {
    Err(TransportError::Status {
        status: 500,
        body: "internal error".to_string(),
    })
}

pub fn ok(body: serde_json::Value) -> Reply {
    Ok(body.to_string())
}

/// Production retry counts with millisecond delays.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        retry_delay_base: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}
