use std::io;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CensusError;

pub const DEFAULT_METADATA_BASE_URL: &str = "https://ethgobblers.com/metadata/";

pub trait MetadataClient: Send + Sync {
    fn fetch_document(&self, token_id: u64) -> Result<Value, CensusError>;
}

#[derive(Clone)]
pub struct MetadataHttpClient {
    client: Client,
    base_url: String,
}

impl MetadataHttpClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, CensusError> {
        let client = http_client(timeout).map_err(|err| CensusError::MetadataHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn document_url(&self, token_id: u64) -> String {
        format!("{}{}", self.base_url, token_id)
    }
}

impl MetadataClient for MetadataHttpClient {
    fn fetch_document(&self, token_id: u64) -> Result<Value, CensusError> {
        let url = self.document_url(token_id);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| CensusError::MetadataHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "metadata request failed".to_string());
            return Err(CensusError::MetadataStatus { status, message });
        }
        response
            .json()
            .map_err(|err| CensusError::MetadataHttp(err.to_string()))
    }
}

/// Builds the shared blocking client. `None` disables the request timeout.
pub(crate) fn http_client(timeout: Option<Duration>) -> Result<Client, String> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("gobbler-census/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| err.to_string())?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| err.to_string())
}

type FetchOutcome = Result<Value, CensusError>;

/// Fetches every id at once, one request in flight per id, no retry.
///
/// The result has one slot per input id, in input order. A failed fetch, or
/// a worker thread the OS refuses to start, is logged and leaves its slot
/// `None`.
pub fn fetch_documents<C: MetadataClient>(client: &C, ids: &[u64]) -> Vec<Option<Value>> {
    thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|&token_id| {
                let spawned = thread::Builder::new()
                    .name(format!("metadata-{token_id}"))
                    .spawn_scoped(scope, move || client.fetch_document(token_id));
                (token_id, spawned)
            })
            .collect();

        handles
            .into_iter()
            .map(|(token_id, spawned)| settle(token_id, spawned.map(|handle| handle.join())))
            .collect()
    })
}

fn settle(token_id: u64, outcome: io::Result<thread::Result<FetchOutcome>>) -> Option<Value> {
    match outcome {
        Ok(Ok(Ok(document))) => {
            debug!(token_id, "metadata fetched");
            Some(document)
        }
        Ok(Ok(Err(err))) => {
            warn!(token_id, error = %err, "error fetching metadata");
            None
        }
        Ok(Err(_)) => {
            warn!(token_id, "metadata fetch worker panicked");
            None
        }
        Err(err) => {
            warn!(token_id, error = %err, "could not start metadata fetch worker");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    struct FlakyClient {
        failing: HashSet<u64>,
    }

    impl MetadataClient for FlakyClient {
        fn fetch_document(&self, token_id: u64) -> Result<Value, CensusError> {
            if self.failing.contains(&token_id) {
                return Err(CensusError::MetadataStatus {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(json!({ "name": format!("Gobbler #{token_id}") }))
        }
    }

    #[test]
    fn failures_stay_in_their_slot() {
        let client = FlakyClient {
            failing: HashSet::from([1, 3]),
        };
        let documents = fetch_documents(&client, &[0, 1, 2, 3]);

        assert_eq!(documents.len(), 4);
        assert!(documents[0].is_some());
        assert!(documents[1].is_none());
        assert_eq!(documents[2].as_ref().unwrap()["name"], "Gobbler #2");
        assert!(documents[3].is_none());
    }

    #[test]
    fn empty_batch_issues_nothing() {
        let client = FlakyClient {
            failing: HashSet::new(),
        };
        assert!(fetch_documents(&client, &[]).is_empty());
    }

    #[test]
    fn worker_that_never_started_leaves_an_empty_slot() {
        let refused = io::Error::new(io::ErrorKind::WouldBlock, "Resource temporarily unavailable");
        assert_eq!(settle(9, Err(refused)), None);
    }

    #[test]
    fn settle_keeps_only_fetched_documents() {
        let document = json!({ "name": "Gobbler #4" });
        assert_eq!(settle(4, Ok(Ok(Ok(document.clone())))), Some(document));

        let failed: FetchOutcome = Err(CensusError::MetadataHttp("connection reset".to_string()));
        assert_eq!(settle(4, Ok(Ok(failed))), None);
        assert_eq!(settle(4, Ok(Err(Box::new("worker panicked")))), None);
    }

    #[test]
    fn document_url_appends_id() {
        let client =
            MetadataHttpClient::new(DEFAULT_METADATA_BASE_URL, None).unwrap();
        assert_eq!(
            client.document_url(42),
            "https://ethgobblers.com/metadata/42"
        );
    }
}
