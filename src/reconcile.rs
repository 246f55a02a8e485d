//! Turns provider JSON of varying shape into one canonical data URL.
//!
//! Shapes are tried in a fixed order and the first structural match wins:
//!
//! 1. `data[0].url`
//! 2. `data[0].b64_json`
//! 3. `output[0]`
//! 4. `images[0]`
//! 5. `image`
//!
//! Nothing outside these paths is inspected.

use crate::{
    data_url,
    error::{Result, StudioError},
    models::OutputFormat,
};
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::Value;

/// An image reference located inside a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// A data URL, an http(s) URL, or bare base64.
    Text(String),
    Object {
        url: Option<String>,
        b64_json: Option<String>,
    },
}

impl ImagePayload {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ImagePayload::Text(s.clone())),
            Value::Object(map) => {
                let url = map.get("url").and_then(Value::as_str).map(str::to_string);
                let b64_json = map
                    .get("b64_json")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (url.is_some() || b64_json.is_some())
                    .then_some(ImagePayload::Object { url, b64_json })
            }
            _ => None,
        }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

pub fn locate(response: &Value) -> Option<ImagePayload> {
    let first_data = present(response.get("data").and_then(|d| d.get(0)));

    if let Some(url) = first_data
        .and_then(|entry| entry.get("url"))
        .and_then(Value::as_str)
    {
        return Some(ImagePayload::Text(url.to_string()));
    }
    if let Some(b64) = first_data
        .and_then(|entry| entry.get("b64_json"))
        .and_then(Value::as_str)
    {
        return Some(ImagePayload::Text(b64.to_string()));
    }

    let candidate = present(response.get("output").and_then(|v| v.get(0)))
        .or_else(|| present(response.get("images").and_then(|v| v.get(0))))
        .or_else(|| present(response.get("image")))?;

    ImagePayload::from_value(candidate)
}

#[derive(Clone)]
pub struct Reconciler {
    client: Client,
}

impl Reconciler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn reconcile(&self, response: &Value, format: OutputFormat) -> Result<String> {
        let payload = locate(response).ok_or_else(|| {
            StudioError::ContentMissing("No image data in provider response".into())
        })?;
        self.resolve(payload, format).await
    }

    /// Blank strings count as absent, so an empty payload is never wrapped
    /// into a header-only data URL.
    pub async fn resolve(&self, payload: ImagePayload, format: OutputFormat) -> Result<String> {
        let payload = match payload {
            ImagePayload::Text(s) if s.trim().is_empty() => ImagePayload::Object {
                url: None,
                b64_json: None,
            },
            ImagePayload::Object { url, b64_json } => ImagePayload::Object {
                url: url.filter(|s| !s.trim().is_empty()),
                b64_json: b64_json.filter(|s| !s.trim().is_empty()),
            },
            text => text,
        };

        match payload {
            ImagePayload::Text(s) if data_url::is_data_url(&s) => Ok(s),
            ImagePayload::Text(s) if data_url::is_http_url(&s) => {
                self.fetch_as_data_url(&s, format).await
            }
            ImagePayload::Text(s) => Ok(data_url::wrap_base64(format.mime_type(), &s)),
            ImagePayload::Object { url: Some(url), .. } => {
                self.fetch_as_data_url(&url, format).await
            }
            ImagePayload::Object {
                b64_json: Some(b64),
                ..
            } => Ok(data_url::wrap_base64(format.mime_type(), &b64)),
            ImagePayload::Object { .. } => Err(StudioError::ContentMissing(
                "No image data in provider response".into(),
            )),
        }
    }

    /// Downloads `url` and re-encodes it. MIME comes from `Content-Type`,
    /// then from sniffing the bytes, then from `fallback`.
    pub async fn fetch_as_data_url(&self, url: &str, fallback: OutputFormat) -> Result<String> {
        log::debug!("Fetching generated image from {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != "application/octet-stream");
        let bytes = response.bytes().await?;

        let mime = header_mime
            .or_else(|| {
                image::guess_format(&bytes)
                    .ok()
                    .map(|f| f.to_mime_type().to_string())
            })
            .unwrap_or_else(|| fallback.mime_type().to_string());

        Ok(data_url::encode(&mime, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_entry_wins_over_everything_else() {
        let doc = json!({
            "data": [{ "url": "https://cdn.example.com/a.png", "b64_json": "QUJD" }],
            "output": ["ZZZZ"],
            "image": "YYYY"
        });
        assert_eq!(
            locate(&doc),
            Some(ImagePayload::Text("https://cdn.example.com/a.png".into()))
        );
    }

    #[test]
    fn b64_entry_is_second() {
        let doc = json!({ "data": [{ "b64_json": "QUJD" }], "images": ["ZZZZ"] });
        assert_eq!(locate(&doc), Some(ImagePayload::Text("QUJD".into())));
    }

    #[test]
    fn flat_lists_then_singular_field() {
        assert_eq!(
            locate(&json!({ "output": ["AAAA"], "images": ["BBBB"] })),
            Some(ImagePayload::Text("AAAA".into()))
        );
        assert_eq!(
            locate(&json!({ "images": ["BBBB"], "image": "CCCC" })),
            Some(ImagePayload::Text("BBBB".into()))
        );
        assert_eq!(
            locate(&json!({ "image": { "b64_json": "CCCC" } })),
            Some(ImagePayload::Object {
                url: None,
                b64_json: Some("CCCC".into())
            })
        );
    }

    #[test]
    fn null_entries_fall_through() {
        let doc = json!({ "data": null, "output": [null], "image": "DDDD" });
        assert_eq!(locate(&doc), Some(ImagePayload::Text("DDDD".into())));
    }

    #[test]
    fn unknown_shapes_are_not_guessed() {
        assert_eq!(locate(&json!({ "result": { "url": "https://x" } })), None);
        assert_eq!(locate(&json!({ "image": 42 })), None);
        assert_eq!(locate(&json!({ "image": { "width": 10 } })), None);
        assert_eq!(locate(&json!([])), None);
    }

    #[tokio::test]
    async fn raw_base64_is_wrapped_with_output_format() {
        let reconciler = Reconciler::new(Client::new());
        let url = reconciler
            .reconcile(&json!({ "output": ["QUJD"] }), OutputFormat::Jpeg)
            .await
            .unwrap();
        assert_eq!(url, "data:image/jpeg;base64,QUJD");
    }

    #[tokio::test]
    async fn data_urls_are_returned_verbatim() {
        let reconciler = Reconciler::new(Client::new());
        let url = reconciler
            .reconcile(&json!({ "image": "data:image/webp;base64,UklG" }), OutputFormat::Png)
            .await
            .unwrap();
        assert_eq!(url, "data:image/webp;base64,UklG");
    }

    #[tokio::test]
    async fn missing_image_is_content_missing() {
        let reconciler = Reconciler::new(Client::new());
        let err = reconciler
            .reconcile(&json!({ "status": "ok" }), OutputFormat::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::ContentMissing(_)));
    }

    #[tokio::test]
    async fn blank_payloads_are_content_missing() {
        let reconciler = Reconciler::new(Client::new());
        for doc in [
            json!({ "image": "" }),
            json!({ "image": "   " }),
            json!({ "data": [{ "url": "" }] }),
            json!({ "data": [{ "b64_json": " " }] }),
            json!({ "output": [""] }),
        ] {
            let err = reconciler.reconcile(&doc, OutputFormat::Png).await.unwrap_err();
            assert!(
                matches!(err, StudioError::ContentMissing(_)),
                "{} gave {:?}",
                doc,
                err
            );
        }
    }

    #[tokio::test]
    async fn blank_url_defers_to_base64_in_the_same_object() {
        let reconciler = Reconciler::new(Client::new());
        let url = reconciler
            .resolve(
                ImagePayload::Object {
                    url: Some(String::new()),
                    b64_json: Some("QUJD".into()),
                },
                OutputFormat::Png,
            )
            .await
            .unwrap();
        assert_eq!(url, "data:image/png;base64,QUJD");
    }
}
