//! Standalone SVG export
//!
//! Turns a snapshot of the displayed tree into a self-contained file:
//!
//! 1. Strip the camera styling from the root element
//! 2. Insert an opaque background rect as the first child
//! 3. Inline every external `<image>` reference as a base64 data URI
//! 4. Serialize, with an XML declaration in front
//!
//! Image failures are not fatal: the image keeps its external reference and
//! the export carries on.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::future::join_all;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::graphic::svg_tree::{self, Element, NodeId, SvgTree};
use crate::models::geometry;

pub const SVG_MIME: &str = "image/svg+xml;charset=utf-8";
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const BACKGROUND_RECT_ID: &str = "background-rect";

/// Style properties the viewer sets on the root element while displaying it
const CAMERA_STYLE_PROPERTIES: &[&str] = &["transform", "transition", "transform-origin"];

/// Raw image payload
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedImage {
    /// MIME type reported by the server; may be empty
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Loads the bytes behind an image reference
#[async_trait(?Send)]
pub trait ImageFetcher {
    async fn fetch_image(&self, href: &str) -> Result<FetchedImage>;
}

/// Hands a finished document to the user (browser download, file, ...)
pub trait FileSink {
    fn save(&self, filename: &str, mime: &str, contents: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportedSvg {
    pub filename: String,
    pub markup: String,
    /// Images converted to data URIs
    pub embedded: usize,
    /// References that could not be embedded and were left external
    pub failed: Vec<String>,
}

/// Run the whole export pipeline over `snapshot`
pub async fn prepare_export(
    snapshot: &str,
    config: &ViewerConfig,
    fetcher: &dyn ImageFetcher,
    filename: &str,
) -> Result<ExportedSvg> {
    log::info!("➤ Preparing SVG for download...");
    let mut tree = SvgTree::parse(snapshot)?;

    strip_camera_styling(&mut tree);
    add_background(&mut tree, &config.background_color);
    let (embedded, failed) = embed_images(&mut tree, fetcher).await;

    let markup = with_declaration(tree.to_markup()?);
    Ok(ExportedSvg {
        filename: filename.to_string(),
        markup,
        embedded,
        failed,
    })
}

/// Remove the viewer's transform styling from the root element
pub fn strip_camera_styling(tree: &mut SvgTree) {
    let root = tree.root();
    let Some(el) = tree.element_mut(root) else {
        return;
    };
    let Some(style) = el.attr("style") else {
        return;
    };
    let stripped = svg_tree::remove_style_properties(style, CAMERA_STYLE_PROPERTIES);
    if stripped.is_empty() {
        el.remove_attr("style");
    } else {
        el.set_attr("style", stripped);
    }
}

/// Insert the background rect behind everything else.
///
/// Sized from `viewBox` when present, otherwise from `width`/`height`.
pub fn add_background(tree: &mut SvgTree, color: &str) -> NodeId {
    let root = tree.root();
    let (x, y, width, height) = match tree.element(root) {
        Some(el) => match el.attr("viewBox") {
            Some(view_box) => {
                let r = geometry::parse_view_box(view_box);
                (r.x0, r.y0, r.width(), r.height())
            }
            None => {
                let len = |name: &str| {
                    el.attr(name)
                        .and_then(geometry::parse_length)
                        .unwrap_or(0.0)
                };
                (0.0, 0.0, len("width"), len("height"))
            }
        },
        None => (0.0, 0.0, 0.0, 0.0),
    };
    log::info!("\tAdding background color: {}", color);

    let rect = Element::new("rect")
        .with_attr("x", x.to_string())
        .with_attr("y", y.to_string())
        .with_attr("width", width.to_string())
        .with_attr("height", height.to_string())
        .with_attr("fill", color)
        .with_attr("id", BACKGROUND_RECT_ID);
    tree.insert_first_child(root, rect)
}

/// Inline every external image; returns (embedded count, failed hrefs)
pub async fn embed_images(tree: &mut SvgTree, fetcher: &dyn ImageFetcher) -> (usize, Vec<String>) {
    let images: Vec<(NodeId, String)> = tree
        .elements_named("image")
        .into_iter()
        .filter_map(|n| Some((n, tree.element(n)?.href()?.to_string())))
        .collect();
    let total = images.len();
    log::info!("\tFound {} images to embed", total);

    let pending = images
        .into_iter()
        .enumerate()
        .filter(|(_, (_, href))| !href.is_empty() && !href.starts_with("data:"))
        .map(|(index, (node, href))| async move {
            let result = fetcher.fetch_image(&href).await;
            (index, node, href, result)
        });
    let results = join_all(pending).await;

    let mut embedded = 0;
    let mut failed = Vec::new();
    for (index, node, href, result) in results {
        match result {
            Ok(image) => {
                let uri = data_uri(&image, &href);
                if let Some(el) = tree.element_mut(node) {
                    set_image_href(el, &uri);
                }
                embedded += 1;
                log::info!("\t[{}/{}] ✓ Embedded image: {}", index + 1, total, href);
            }
            Err(e) => {
                let err = ViewerError::ImageEmbedFailed {
                    href: href.clone(),
                    reason: e.to_string(),
                };
                log::warn!("\t[{}/{}] ✗ {}", index + 1, total, err);
                failed.push(href);
            }
        }
    }
    (embedded, failed)
}

/// Write `href` into whichever reference attributes the image carries
fn set_image_href(el: &mut Element, href: &str) {
    let has_plain = el.attr("href").is_some();
    let has_xlink = el.attr("xlink:href").is_some();
    if has_plain {
        el.set_attr("href", href);
    }
    if has_xlink || !has_plain {
        el.set_attr("xlink:href", href);
    }
}

/// `data:` URI for a fetched image; the MIME type falls back to the file extension
pub fn data_uri(image: &FetchedImage, href: &str) -> String {
    let mime = image
        .mime
        .split(';')
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| mime_from_extension(href));
    format!("data:{};base64,{}", mime, BASE64.encode(&image.bytes))
}

pub fn mime_from_extension(href: &str) -> &'static str {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

/// Prefix the XML declaration unless one is already there
pub fn with_declaration(markup: String) -> String {
    if markup.starts_with("<?xml") {
        markup
    } else {
        format!("{}\n{}", XML_DECLARATION, markup)
    }
}
