//! Browser DOM surface
//!
//! The tree graphic lives inside a wrapper `div` that is placed in the host
//! container. New markup is parsed into a detached element first, so a bad
//! document never replaces the graphic already on screen.

use kurbo::{Affine, Rect};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, SvgGraphicsElement, SvgsvgElement, XmlSerializer};

use super::GraphicSurface;
use crate::api::helpers::js_message;
use crate::error::{Result, ViewerError};
use crate::models::Camera;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const WRAPPER_ID: &str = "svgWrapper";
const WRAPPER_STYLE: &str = "width: 100%; height: 100%; cursor: grab; overflow: hidden;";

pub struct DomSurface {
    document: Document,
    container: HtmlElement,
    wrapper: HtmlElement,
    svg: Option<SvgsvgElement>,
}

impl DomSurface {
    /// Surface for the element with id `container_id`
    pub fn attach(container_id: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ViewerError::InvalidGraphic("no document".to_string()))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| ViewerError::ElementNotFound(container_id.to_string()))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ViewerError::InvalidGraphic(format!("{} is not an HTML element", container_id)))?;
        log::info!("Family tree container found");

        let wrapper = document
            .create_element("div")
            .map_err(|e| ViewerError::InvalidGraphic(js_message(&e)))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ViewerError::InvalidGraphic("wrapper is not an HTML element".to_string()))?;
        wrapper.set_id(WRAPPER_ID);
        wrapper
            .set_attribute("style", WRAPPER_STYLE)
            .map_err(|e| ViewerError::InvalidGraphic(js_message(&e)))?;

        Ok(Self {
            document,
            container,
            wrapper,
            svg: None,
        })
    }

    /// Element that receives wheel, mouse and touch input
    pub fn wrapper(&self) -> &HtmlElement {
        &self.wrapper
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Live element for `id` inside the mounted graphic
    pub fn element(&self, id: &str) -> Option<Element> {
        self.svg.as_ref()?.get_element_by_id(id)
    }
}

impl GraphicSurface for DomSurface {
    fn mount(&mut self, markup: &str) -> Result<()> {
        let staging = self
            .document
            .create_element("div")
            .map_err(|e| ViewerError::InvalidGraphic(js_message(&e)))?;
        staging.set_inner_html(markup);
        let svg = staging
            .query_selector("svg")
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<SvgsvgElement>().ok())
            .ok_or_else(|| ViewerError::InvalidGraphic("SVG element not found in loaded content".to_string()))?;

        self.wrapper.set_inner_html("");
        self.wrapper
            .append_child(&svg)
            .map_err(|e| ViewerError::InvalidGraphic(js_message(&e)))?;
        self.container.set_inner_html("");
        self.container
            .append_child(&self.wrapper)
            .map_err(|e| ViewerError::InvalidGraphic(js_message(&e)))?;
        self.svg = Some(svg);
        Ok(())
    }

    fn show_error(&mut self, message: &str) {
        self.svg = None;
        self.container
            .set_inner_html(&format!("<p style=\"color:red; padding:20px;\">{}</p>", message));
    }

    fn is_mounted(&self) -> bool {
        self.svg.is_some()
    }

    fn contains(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, id: &str, class: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.class_list().add_1(class).is_ok())
    }

    fn remove_class(&mut self, id: &str, class: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.class_list().remove_1(class).is_ok())
    }

    fn ids_with_class(&self, class: &str) -> Vec<String> {
        let Some(svg) = self.svg.as_ref() else {
            return Vec::new();
        };
        let Ok(nodes) = svg.query_selector_all(&format!(".{}", class)) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| el.id())
            .filter(|id| !id.is_empty())
            .collect()
    }

    fn bbox(&self, id: &str) -> Option<Rect> {
        let el = self.element(id)?.dyn_into::<SvgGraphicsElement>().ok()?;
        let b = el.get_b_box().ok()?;
        Some(Rect::new(
            f64::from(b.x()),
            f64::from(b.y()),
            f64::from(b.x() + b.width()),
            f64::from(b.y() + b.height()),
        ))
    }

    fn ctm(&self, id: &str) -> Option<Affine> {
        let el = self.element(id)?.dyn_into::<SvgGraphicsElement>().ok()?;
        let m = el.get_ctm()?;
        Some(Affine::new([
            f64::from(m.a()),
            f64::from(m.b()),
            f64::from(m.c()),
            f64::from(m.d()),
            f64::from(m.e()),
            f64::from(m.f()),
        ]))
    }

    fn apply_transform(&mut self, camera: &Camera, transition: &str) {
        let Some(svg) = self.svg.as_ref() else {
            return;
        };
        let style = svg.style();
        let applied = style
            .set_property("transition", transition)
            .and_then(|_| style.set_property("transform-origin", "0 0"))
            .and_then(|_| style.set_property("transform", &camera.to_css()));
        if let Err(e) = applied {
            log::warn!("Could not apply camera transform: {}", js_message(&e));
        }
    }

    fn force_reflow(&mut self, id: &str) {
        if let Some(el) = self.element(id) {
            let _ = el.get_bounding_client_rect();
        }
    }

    fn set_member_image(&mut self, id: &str, href: &str) -> bool {
        let Some(image) = self
            .element(id)
            .and_then(|member| member.query_selector(".img-container").ok().flatten())
        else {
            return false;
        };
        image.set_attribute_ns(Some(XLINK_NS), "href", href).is_ok()
    }

    fn set_member_text(&mut self, id: &str, part_class: &str, text: &str) -> bool {
        let selector = format!(".{} tspan", part_class);
        match self
            .element(id)
            .and_then(|member| member.query_selector(&selector).ok().flatten())
        {
            Some(tspan) => {
                tspan.set_text_content(Some(text));
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Result<String> {
        let svg = self.svg.as_ref().ok_or(ViewerError::NotLoaded)?;
        let serializer = XmlSerializer::new().map_err(|e| ViewerError::Serialize(js_message(&e)))?;
        serializer
            .serialize_to_string(svg)
            .map_err(|e| ViewerError::Serialize(js_message(&e)))
    }
}
