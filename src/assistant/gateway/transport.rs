use crate::assistant::controller::error::{WaiterError, WaiterResult};
use crate::assistant::gateway::endpoint::Endpoint;
use crate::assistant::model::config::{ClientConfig, RequestEncoding};
use log::debug;
use reqwest::Client;
use serde_json::{Map, Value};

/// one call to the backend, parameters are flat strings as the PHP side expects
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApiRequest {
    pub endpoint: Endpoint,
    pub params: Vec<(&'static str, String)>,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: vec![],
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Delivers a request and hands back the raw body text.
///
/// Non-2xx statuses and network failures are reported as errors here,
/// everything about the body is left to the normalizer.
pub(crate) trait Transport {
    async fn send(&self, request: &ApiRequest) -> WaiterResult<String>;
}

pub(crate) struct HttpTransport {
    client: Client,
    base_url: String,
    encoding: RequestEncoding,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> WaiterResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            encoding: config.encoding,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> WaiterResult<String> {
        let url = self.url(request.endpoint);
        debug!("sending {} to {}", request.endpoint.name(), url);
        let builder = self.client.post(&url);
        let builder = match self.encoding {
            RequestEncoding::Form => builder.form(&request.params),
            RequestEncoding::Json => {
                let body = request
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                    .collect::<Map<_, _>>();
                builder.json(&body)
            }
        };
        let res = builder.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(WaiterError::ServerStatus {
                code: status.as_u16(),
            });
        }
        Ok(res.text().await?)
    }
}
