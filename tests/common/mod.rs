//! Scripted in-memory transport for data source tests.
#![allow(dead_code)]

use http::{HeaderMap, HeaderName, HeaderValue};
use rangenet::http::connection::{
    BodyWriter, ConnectionFuture, ConnectionRequest, Connector, HttpConnection, PayloadStream,
};
use rangenet::http::HttpMethod;
use rangenet::NetError;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// What the fake server will answer.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub code: u16,
    pub message: String,
    pub headers: Vec<(String, String)>,
    pub body: ScriptedBody,
}

#[derive(Debug, Clone)]
pub enum ScriptedBody {
    Bytes(Vec<u8>),
    /// Never ends; every byte is the given value.
    Endless(u8),
    Absent,
}

impl ScriptedBody {
    fn stream(&self) -> Option<PayloadStream> {
        match self {
            ScriptedBody::Bytes(bytes) => {
                let stream: PayloadStream = Box::pin(Cursor::new(bytes.clone()));
                Some(stream)
            }
            ScriptedBody::Endless(byte) => {
                let stream: PayloadStream = Box::pin(tokio::io::repeat(*byte));
                Some(stream)
            }
            ScriptedBody::Absent => None,
        }
    }
}

impl ScriptedResponse {
    pub fn new(code: u16, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            headers: Vec::new(),
            body: ScriptedBody::Absent,
        }
    }

    pub fn ok(body: &[u8]) -> Self {
        Self::new(200, "OK")
            .header("Content-Length", &body.len().to_string())
            .body(body)
    }

    pub fn redirect(code: u16, location: &str) -> Self {
        Self::new(code, "Found").header("Location", location)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = ScriptedBody::Bytes(body.to_vec());
        self
    }

    pub fn endless_body(mut self, byte: u8) -> Self {
        self.body = ScriptedBody::Endless(byte);
        self
    }
}

/// One executed exchange as seen by the fake server.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub fixed_length: Option<u64>,
    pub body: Vec<u8>,
    pub follow_redirects: bool,
}

impl Exchange {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Shared {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    last: Mutex<Option<ScriptedResponse>>,
    exchanges: Mutex<Vec<Exchange>>,
    connections: AtomicUsize,
    disconnects: AtomicUsize,
    connect_error: Mutex<Option<NetError>>,
}

/// Connector answering from a script. When the script runs out the last
/// response is repeated.
#[derive(Clone, Default)]
pub struct FakeConnector {
    shared: Arc<Shared>,
}

impl FakeConnector {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        let connector = Self::default();
        connector
            .shared
            .responses
            .lock()
            .unwrap()
            .extend(responses);
        connector
    }

    /// Make every `connect` fail with `error`.
    pub fn failing(error: NetError) -> Self {
        let connector = Self::default();
        *connector.shared.connect_error.lock().unwrap() = Some(error);
        connector
    }

    pub fn push(&self, response: ScriptedResponse) {
        self.shared.responses.lock().unwrap().push_back(response);
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.shared.exchanges.lock().unwrap().clone()
    }

    pub fn last_exchange(&self) -> Exchange {
        self.exchanges().pop().expect("no exchange recorded")
    }

    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.shared.disconnects.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> ScriptedResponse {
        let next = self.shared.responses.lock().unwrap().pop_front();
        let mut last = self.shared.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| ScriptedResponse::new(500, "No script")),
        }
    }
}

impl Connector for FakeConnector {
    fn open_connection(
        &self,
        request: &ConnectionRequest,
    ) -> Result<Box<dyn HttpConnection>, NetError> {
        self.shared.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            connector: self.clone(),
            request: request.clone(),
            headers: Vec::new(),
            fixed_length: None,
            body: Vec::new(),
            response: None,
            response_headers: HeaderMap::new(),
            payload: None,
            disconnected: false,
        }))
    }
}

pub struct FakeConnection {
    connector: FakeConnector,
    request: ConnectionRequest,
    headers: Vec<(String, String)>,
    fixed_length: Option<u64>,
    body: Vec<u8>,
    response: Option<ScriptedResponse>,
    response_headers: HeaderMap,
    payload: Option<PayloadStream>,
    disconnected: bool,
}

impl HttpConnection for FakeConnection {
    fn url(&self) -> &Url {
        &self.request.url
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        if self.response.is_some() {
            return Err(NetError::RequestAlreadySent);
        }
        match self.headers.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn set_fixed_length_streaming_mode(&mut self, len: u64) -> Result<(), NetError> {
        self.fixed_length = Some(len);
        Ok(())
    }

    fn output_stream(&mut self) -> Result<BodyWriter<'_>, NetError> {
        Ok(Box::pin(&mut self.body))
    }

    fn connect(&mut self) -> ConnectionFuture<'_, ()> {
        Box::pin(async move {
            if let Some(error) = *self.connector.shared.connect_error.lock().unwrap() {
                return Err(error);
            }

            self.connector.shared.exchanges.lock().unwrap().push(Exchange {
                url: self.request.url.clone(),
                method: self.request.method,
                headers: self.headers.clone(),
                fixed_length: self.fixed_length,
                body: self.body.clone(),
                follow_redirects: self.request.follow_redirects,
            });

            let response = self.connector.next_response();
            for (name, value) in &response.headers {
                let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
                self.response_headers
                    .append(name, HeaderValue::from_str(value).unwrap());
            }
            self.payload = response.body.stream();
            self.response = Some(response);
            Ok(())
        })
    }

    fn response_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.code)
    }

    fn response_message(&self) -> &str {
        self.response.as_ref().map(|r| r.message.as_str()).unwrap_or("")
    }

    fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    fn take_input_stream(&mut self) -> Option<PayloadStream> {
        match self.response_code() {
            Some(code) if (200..300).contains(&code) => self.payload.take(),
            _ => None,
        }
    }

    fn take_error_stream(&mut self) -> Option<PayloadStream> {
        match self.response_code() {
            Some(code) if !(200..300).contains(&code) => self.payload.take(),
            _ => None,
        }
    }

    fn disconnect(&mut self) {
        if !self.disconnected {
            self.disconnected = true;
            self.payload = None;
            self.connector
                .shared
                .disconnects
                .fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}
