//! Outbound request types.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP methods the API uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A file attached to a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Multipart form body. The transport picks the boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipartForm {
    pub texts: Vec<(String, String)>,
    pub files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.texts.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.files.push((
            name.into(),
            FilePart {
                file_name: file_name.into(),
                content_type,
                data: data.into(),
            },
        ));
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.files.is_empty()
    }
}

/// Request payload as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    None,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart(MultipartForm),
}

/// Request payload after serialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OutgoingBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Multipart(MultipartForm),
}

/// A request relative to the versioned API root.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchRequest {
    pub endpoint: String,
    pub method: Method,
    pub body: RequestBody,
    pub headers: BTreeMap<String, String>,
    /// Attach the bearer credential when one is available.
    pub authorize: bool,
}

impl DispatchRequest {
    #[inline]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            body: RequestBody::None,
            headers: BTreeMap::new(),
            authorize: true,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Skip the bearer credential (login and registration).
    pub fn anonymous(mut self) -> Self {
        self.authorize = false;
        self
    }

    /// Compose the final request against `base_url`.
    ///
    /// Header precedence, lowest first: content type chosen from the body,
    /// bearer credential, caller headers. Multipart bodies never get a
    /// content type here.
    pub fn prepare(self, base_url: &str, token: Option<&str>) -> crate::Result<OutgoingRequest> {
        let url = format!("{}{}", base_url, self.endpoint);
        let mut out = OutgoingRequest {
            method: self.method,
            url,
            headers: Vec::new(),
            body: OutgoingBody::Empty,
        };

        match self.body {
            RequestBody::None => {
                out.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE);
            }
            RequestBody::Json(value) => {
                out.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE);
                out.body = OutgoingBody::Bytes(Bytes::from(serde_json::to_vec(&value)?));
            }
            RequestBody::Form(fields) => {
                out.set_header(CONTENT_TYPE, FORM_CONTENT_TYPE);
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields.iter())
                    .finish();
                out.body = OutgoingBody::Bytes(Bytes::from(encoded));
            }
            RequestBody::Multipart(form) => {
                out.body = OutgoingBody::Multipart(form);
            }
        }

        if self.authorize {
            if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
                out.set_header(AUTHORIZATION, format!("Bearer {}", token));
            }
        }

        let multipart = matches!(out.body, OutgoingBody::Multipart(_));
        for (k, v) in self.headers {
            if multipart && k.eq_ignore_ascii_case(CONTENT_TYPE) {
                continue;
            }
            out.set_header(k, v);
        }

        Ok(out)
    }
}

/// Fully composed request handed to an [`crate::ApiNetwork`].
#[derive(Clone, Debug, PartialEq)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: OutgoingBody,
}

impl OutgoingRequest {
    /// Insert or replace a header, matching names case-insensitively.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            OutgoingBody::Bytes(b) => Some(b),
            _ => None,
        }
    }
}
