use std::{
    error::Error as StdError,
    fmt,
    io::{self, Read},
    time::Duration,
};

use reqwest::{blocking::Client, Url};

use crate::config::SearchConfig;

/// Network-level failure (DNS, refused connection, timeout, broken body stream).
#[derive(Debug)]
pub struct TransportError(Box<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self(err.into())
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::new(err)
    }
}

/// Streaming response body that must be released once the caller is done with it.
pub trait ResponseBody: Read + Send {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseBody for reqwest::blocking::Response {}

impl ResponseBody for io::Cursor<Vec<u8>> {}

pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn ResponseBody>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl ResponseBody + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport: Send + Sync {
    /// Issues a plain GET with no extra headers or body.
    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::from_config(&SearchConfig::default())
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().timeout(config.timeout_secs.map(Duration::from_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status().as_u16();
        Ok(HttpResponse::new(status, response))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn success_range_is_2xx_only() {
        assert!(HttpResponse::new(200, io::Cursor::new(Vec::new())).is_success());
        assert!(HttpResponse::new(204, io::Cursor::new(Vec::new())).is_success());
        assert!(!HttpResponse::new(301, io::Cursor::new(Vec::new())).is_success());
        assert!(!HttpResponse::new(500, io::Cursor::new(Vec::new())).is_success());
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
            listener.local_addr().expect("local addr").port()
        };
        let transport = ReqwestTransport::from_config(&SearchConfig {
            timeout_secs: Some(5),
            ..SearchConfig::default()
        })
        .expect("build transport");
        let url = Url::parse(&format!("http://127.0.0.1:{port}/events")).expect("url");

        let err = transport.get(&url).expect_err("nothing listens on the port");
        assert!(err.inner().is::<reqwest::Error>());
    }

    #[test]
    fn transport_error_preserves_message() {
        let err = TransportError::from(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(err.to_string(), "connection refused");
    }
}
