use std::time::Duration;

use agora_core::CanonicalError;
use reqwest::header::ACCEPT;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::strategy::{CallStrategy, Method, Operation};

/// REST-style transport for `http://` and `https://` endpoints.
///
/// Services may also announce themselves as `rest://host:port`, which is
/// called as plain `http://`. GET and DELETE send the request as a query string, POST and PUT as a JSON
/// body. Any status outside 2xx is an application-level answer.
#[derive(Debug, Clone)]
pub struct RestStrategy {
    http: reqwest::Client,
}

impl RestStrategy {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Rewrite a `rest://` endpoint to the `http://` URL it is served on.
///
/// `Url::set_scheme` refuses to turn a non-special scheme into `http`, so the
/// rest of the URI is reparsed under the new scheme.
pub fn http_endpoint(endpoint: &Url) -> Result<Url> {
    if endpoint.scheme() != "rest" {
        return Ok(endpoint.clone());
    }
    let rest = &endpoint.as_str()["rest".len()..];
    Url::parse(&format!("http{rest}"))
        .map_err(|e| Error::InvalidEndpoint(endpoint.clone(), e.to_string()))
}

/// Append the segments of `path` to the endpoint's own path.
pub fn target(endpoint: &Url, path: &str) -> Result<Url> {
    let mut url = http_endpoint(endpoint)?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidEndpoint(endpoint.clone(), "cannot carry a path".into()))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// Empty bodies decode as JSON `null`, so `()` and `Option<T>` replies work.
fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))
}

#[async_trait::async_trait]
impl CallStrategy for RestStrategy {
    async fn attempt<Req, Res>(
        &self,
        endpoint: &Url,
        operation: &Operation,
        request: &Req,
    ) -> Result<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        let url = target(endpoint, &operation.path)?;
        let builder = self
            .http
            .request(http_method(operation.method), url)
            .header(ACCEPT, "application/json");

        let builder = match operation.method {
            Method::Get | Method::Delete => builder.query(request),
            Method::Post | Method::Put => builder.json(request),
        };

        let response = builder.send().await?;
        let code = CanonicalError::from_http(response.status().as_u16());
        if !code.is_ok() {
            return Err(Error::Rejected(code));
        }

        let body = response.bytes().await?;
        decode_json(&body)
    }
}
