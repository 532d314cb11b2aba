// Shared fixtures for the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use family_tree_wasm::controller::{GraphicLoader, ManualClock};
use family_tree_wasm::export::{FetchedImage, FileSink, ImageFetcher};
use family_tree_wasm::graphic::MemorySurface;
use family_tree_wasm::{Result, ViewerConfig, ViewerError, ViewportController};

/// Two members, A and B, plus a decorative frame that is not a member
pub const TREE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 800 600">
  <rect id="frame" width="800" height="600" fill="none"/>
  <g id="A" class="member" transform="translate(100 100)">
    <image class="img-container" xlink:href="assets/members-img/a.png" width="40" height="40"/>
    <text class="main-text" x="50" y="15"><tspan>Name</tspan></text>
    <text class="sub-text" x="50" y="35"><tspan>Dates</tspan></text>
    <rect width="200" height="50" fill="none"/>
  </g>
  <g id="B" class="member" transform="translate(400 300)">
    <image class="img-container" xlink:href="data:image/png;base64,AAAA" width="40" height="40"/>
    <text class="main-text" x="50" y="15"><tspan>Name</tspan></text>
    <rect width="200" height="50" fill="none"/>
  </g>
</svg>"##;

pub type TestController = ViewportController<MemorySurface>;

pub fn controller() -> (TestController, ManualClock) {
    let clock = ManualClock::new();
    let ctrl = ViewportController::new(
        MemorySurface::new(),
        ViewerConfig::default(),
        Box::new(clock.clone()),
    );
    (ctrl, clock)
}

/// Controller with [`TREE`] loaded
pub fn loaded() -> (TestController, ManualClock) {
    let (mut ctrl, clock) = controller();
    ctrl.begin_load();
    ctrl.complete_load(Ok(TREE.to_string()))
        .expect("fixture tree should load");
    (ctrl, clock)
}

/// Serves text by URL; anything else is a 404
#[derive(Default)]
pub struct FakeLoader {
    pub files: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeLoader {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.files.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait(?Send)]
impl GraphicLoader for FakeLoader {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.borrow_mut().push(url.to_string());
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| ViewerError::fetch(url, "HTTP error! status: 404"))
    }
}

/// Serves image bytes by href
#[derive(Default)]
pub struct FakeImages {
    pub images: HashMap<String, FetchedImage>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeImages {
    pub fn with(mut self, href: &str, mime: &str, bytes: &[u8]) -> Self {
        self.images.insert(
            href.to_string(),
            FetchedImage {
                mime: mime.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        self
    }
}

#[async_trait(?Send)]
impl ImageFetcher for FakeImages {
    async fn fetch_image(&self, href: &str) -> Result<FetchedImage> {
        self.requests.borrow_mut().push(href.to_string());
        self.images
            .get(href)
            .cloned()
            .ok_or_else(|| ViewerError::fetch(href, "HTTP error! status: 404"))
    }
}

/// Keeps every saved file as (filename, mime, contents)
#[derive(Default)]
pub struct RecordingSink {
    pub saved: RefCell<Vec<(String, String, String)>>,
}

impl FileSink for RecordingSink {
    fn save(&self, filename: &str, mime: &str, contents: &str) -> Result<()> {
        self.saved
            .borrow_mut()
            .push((filename.to_string(), mime.to_string(), contents.to_string()));
        Ok(())
    }
}
