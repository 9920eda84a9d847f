//! reqwest-backed [`TweetApi`] talking to a running tweetgen server.

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::server::ErrorBody;
use crate::session::{ClientError, TweetApi};
use crate::types::{
    GenerationRequest, GenerationResponse, ShareRequest, ShareResponse, SharedTweetRecord,
};

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Multipart form in the shape the browser client sends.
    fn generation_form(request: &GenerationRequest) -> Result<Form, ClientError> {
        let menus =
            serde_json::to_string(&request.menus).map_err(|e| ClientError::Decode(e.to_string()))?;
        let mut form = Form::new()
            .text("menus", menus)
            .text("satisfaction", request.satisfaction.as_str().to_string());
        if let Some(name) = &request.restaurant_name {
            form = form.text("restaurantName", name.clone());
        }
        for (i, image) in request.images.iter().enumerate() {
            let part = Part::bytes(image.as_bytes().to_vec())
                .file_name(format!("image-{}", i + 1))
                .mime_str(image.mime_type())
                .map_err(|e| ClientError::Decode(e.to_string()))?;
            form = form.part("images", part);
        }
        Ok(form)
    }
}

/// Decode a success body, or turn an error response into [`ClientError::Api`].
async fn read_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }
    let text = resp.text().await.unwrap_or_default();
    let (message, kind) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.message, body.kind),
        Err(_) if !text.is_empty() => (text, None),
        Err(_) => (status.to_string(), None),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        kind,
    })
}

fn network(err: reqwest::Error) -> ClientError {
    ClientError::Network(err.to_string())
}

#[async_trait::async_trait]
impl TweetApi for HttpApi {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/generate-tweet"))
            .multipart(Self::generation_form(request)?)
            .send()
            .await
            .map_err(network)?;
        read_response(resp).await
    }

    async fn share(&self, request: &ShareRequest) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/share"))
            .json(request)
            .send()
            .await
            .map_err(network)?;
        let body: ShareResponse = read_response(resp).await?;
        Ok(body.share_id)
    }

    async fn get_share(&self, id: &str) -> Result<SharedTweetRecord, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/api/share/{}", id)))
            .send()
            .await
            .map_err(network)?;
        read_response(resp).await
    }
}
