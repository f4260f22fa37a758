use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::CensusError;
use crate::metadata::http_client;

pub trait SupplyClient {
    fn total_supply(&self) -> Result<u64, CensusError>;
}

pub struct SupplyHttpClient {
    client: Client,
    url: String,
    field: String,
    api_key: String,
}

impl SupplyHttpClient {
    pub fn new(
        url: &str,
        field: &str,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self, CensusError> {
        let client = http_client(timeout).map_err(CensusError::SupplyHttp)?;
        Ok(Self {
            client,
            url: url.to_string(),
            field: field.to_string(),
            api_key,
        })
    }
}

impl SupplyClient for SupplyHttpClient {
    fn total_supply(&self) -> Result<u64, CensusError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .map_err(|err| CensusError::SupplyHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "total supply request failed".to_string());
            return Err(CensusError::SupplyStatus { status, message });
        }
        let body: Value = response
            .json()
            .map_err(|err| CensusError::SupplyHttp(err.to_string()))?;
        extract_total_supply(&body, &self.field)
    }
}

/// Reads `field` from a supply response, accepting a JSON number or a
/// numeric string.
pub fn extract_total_supply(body: &Value, field: &str) -> Result<u64, CensusError> {
    let value = body
        .get(field)
        .ok_or_else(|| CensusError::SupplyField(field.to_string()))?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .ok_or_else(|| CensusError::SupplyField(field.to_string()))
}
