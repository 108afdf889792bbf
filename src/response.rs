//! Input shape consumed by the analyzer.
//!
//! The core never performs I/O: callers adapt whatever HTTP client they
//! use into a [`Response`] and wrap each calibration or test probe in an
//! [`Observation`].

/// A response-like value: status, reason, headers, body, and the
/// ordered redirect history that preceded it.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// HTTP status code.
    pub status: i32,
    /// Reason phrase.
    pub reason: String,
    /// Ordered header collection.
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    pub body: Vec<u8>,
    /// Prior responses in the redirect chain, oldest first. Empty when
    /// no redirect occurred.
    pub history: Vec<Response>,
}

impl Response {
    /// Create a response with the given status line.
    pub fn new(status: i32, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a prior response to the redirect history.
    pub fn redirected_from(mut self, prior: Response) -> Self {
        self.history.push(prior);
        self
    }

    /// Render the header collection as one `name: value` per line text
    /// block, the form the headers facet tokenizes.
    pub fn header_text(&self) -> String {
        let mut text = String::new();
        for (name, value) in &self.headers {
            text.push_str(name);
            text.push_str(": ");
            text.push_str(value);
            text.push('\n');
        }
        text
    }
}

/// One observed probe: the response (absent on transport failure), the
/// elapsed time as text, the error text (empty when none), and the
/// opaque payload forwarded to extension hooks.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// The response, or `None` when the transport failed.
    pub response: Option<&'a Response>,
    /// Elapsed time, numeric, passed as text.
    pub elapsed: &'a str,
    /// Error text; empty when no error occurred.
    pub error: &'a str,
    /// The injected probe payload, forwarded unchanged to extensions.
    pub payload: &'a str,
}

impl<'a> Observation<'a> {
    /// Observation of a completed response.
    pub fn of(response: &'a Response, elapsed: &'a str) -> Self {
        Self {
            response: Some(response),
            elapsed,
            error: "",
            payload: "",
        }
    }

    /// Observation of a transport failure.
    pub fn failure(error: &'a str, elapsed: &'a str) -> Self {
        Self {
            response: None,
            elapsed,
            error,
            payload: "",
        }
    }

    /// Attach the probe payload.
    pub fn payload(mut self, payload: &'a str) -> Self {
        self.payload = payload;
        self
    }

    /// Attach error text.
    pub fn error(mut self, error: &'a str) -> Self {
        self.error = error;
        self
    }
}
