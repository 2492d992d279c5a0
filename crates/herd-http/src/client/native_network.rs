use crate::error::{HttpError, Result};
use crate::traits::ApiNetwork;
use crate::types::{ApiResponse, MultipartForm, OutgoingBody, OutgoingRequest};
use async_trait::async_trait;
use reqwest::Client;

/// [`ApiNetwork`] backed by a `reqwest` client.
pub struct NativeNetwork {
    client: Client,
}

impl NativeNetwork {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn multipart_form(form: MultipartForm) -> Result<reqwest::multipart::Form> {
    let mut out = reqwest::multipart::Form::new();
    for (name, value) in form.texts {
        out = out.text(name, value);
    }
    for (name, file) in form.files {
        let mut part =
            reqwest::multipart::Part::bytes(file.data.to_vec()).file_name(file.file_name);
        if let Some(ct) = file.content_type {
            part = part
                .mime_str(&ct)
                .map_err(|e| HttpError::Multipart(e.to_string()))?;
        }
        out = out.part(name, part);
    }
    Ok(out)
}

#[async_trait]
impl ApiNetwork for NativeNetwork {
    async fn send(&self, request: OutgoingRequest) -> Result<ApiResponse> {
        let mut req_builder = self
            .client
            .request(request.method.into(), request.url.as_str());

        for (k, v) in &request.headers {
            req_builder = req_builder.header(k.as_str(), v.as_str());
        }

        req_builder = match request.body {
            OutgoingBody::Empty => req_builder,
            OutgoingBody::Bytes(bytes) => req_builder.body(bytes),
            OutgoingBody::Multipart(form) => req_builder.multipart(multipart_form(form)?),
        };

        let response = req_builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let mut headers = std::collections::BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
