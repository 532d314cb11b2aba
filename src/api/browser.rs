//! Browser implementations of the viewer's I/O seams
//!
//! `fetch` for the graphic, member data and export images, `performance.now()`
//! for deadlines, and a Blob URL behind a temporary anchor for downloads.

use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Request, RequestInit, RequestMode, Response, Url};

use super::helpers::js_message;
use crate::controller::{Clock, GraphicLoader};
use crate::error::{Result, ViewerError};
use crate::export::{FetchedImage, FileSink, ImageFetcher};

async fn fetch_response(url: &str) -> Result<Response> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| ViewerError::fetch(url, js_message(&e)))?;
    let window = web_sys::window().ok_or_else(|| ViewerError::fetch(url, "no window object"))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| ViewerError::fetch(url, js_message(&e)))?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| ViewerError::fetch(url, "response is not a Response"))?;

    log::debug!("fetch {} response: {}", url, response.status());
    if !response.ok() {
        return Err(ViewerError::fetch(url, format!("HTTP error! status: {}", response.status())));
    }
    Ok(response)
}

/// `fetch` returning the body as text
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchLoader;

#[async_trait(?Send)]
impl GraphicLoader for FetchLoader {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = fetch_response(url).await?;
        let text = response
            .text()
            .map_err(|e| ViewerError::fetch(url, js_message(&e)))?;
        JsFuture::from(text)
            .await
            .map_err(|e| ViewerError::fetch(url, js_message(&e)))?
            .as_string()
            .ok_or_else(|| ViewerError::fetch(url, "body is not text"))
    }
}

/// `fetch` returning the body bytes and content type
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchImages;

#[async_trait(?Send)]
impl ImageFetcher for FetchImages {
    async fn fetch_image(&self, href: &str) -> Result<FetchedImage> {
        let response = fetch_response(href).await?;
        let mime = response
            .headers()
            .get("content-type")
            .ok()
            .flatten()
            .unwrap_or_default();
        let buffer = response
            .array_buffer()
            .map_err(|e| ViewerError::fetch(href, js_message(&e)))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|e| ViewerError::fetch(href, js_message(&e)))?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        Ok(FetchedImage { mime, bytes })
    }
}

/// Downloads through an object URL and a temporary `<a download>`
#[derive(Clone, Copy, Debug, Default)]
pub struct BlobDownload;

impl FileSink for BlobDownload {
    fn save(&self, filename: &str, mime: &str, contents: &str) -> Result<()> {
        let fail = |e: JsValue| ViewerError::Download(js_message(&e));

        let parts = js_sys::Array::of1(&JsValue::from_str(contents));
        let bag = BlobPropertyBag::new();
        bag.set_type(mime);
        let blob = Blob::new_with_str_sequence_and_options(&parts, &bag).map_err(fail)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(fail)?;

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ViewerError::Download("no document".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| ViewerError::Download("no document body".to_string()))?;
        let anchor = document
            .create_element("a")
            .map_err(fail)?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| ViewerError::Download("could not create anchor".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(filename);

        let clicked = body.append_child(&anchor).map(|_| anchor.click());
        anchor.remove();
        let revoked = Url::revoke_object_url(&url);
        clicked.map_err(fail)?;
        revoked.map_err(fail)
    }
}

/// `performance.now()`, falling back to `Date.now()`
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}
