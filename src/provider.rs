use std::error::Error;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body;
use http_body_util::BodyExt;
use realtime::HttpRequest;

/// Outbound HTTP over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct Provider {
    client: reqwest::Client,
}

impl Provider {
    /// Creates a provider whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

impl HttpRequest for Provider {
    fn fetch<T>(&self, request: Request<T>) -> impl Future<Output = Result<Response<Bytes>>> + Send
    where
        T: Body + Send + 'static,
        T::Data: Send,
        T::Error: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let client = self.client.clone();

        async move {
            let (parts, body) = request.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|err| {
                    let err: Box<dyn Error + Send + Sync> = err.into();
                    anyhow!("collecting request body: {err}")
                })?
                .to_bytes();

            let mut outbound =
                client.request(parts.method, parts.uri.to_string()).headers(parts.headers);
            if !body.is_empty() {
                outbound = outbound.body(body);
            }

            let response = outbound.send().await.context("sending request")?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await.context("reading response body")?;

            let mut reply = Response::new(bytes);
            *reply.status_mut() = status;
            *reply.headers_mut() = headers;
            Ok(reply)
        }
    }
}
