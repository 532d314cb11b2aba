//! In-memory graphic surface
//!
//! Holds the mounted graphic as an [`SvgTree`] and mirrors what the browser
//! would do to it: camera styling goes into the root `style` attribute and
//! classes are edited on the elements themselves.
//!
//! `ctm` stops at the root's user space. The browser's `getCTM` also applies
//! the root `viewBox` to viewport scaling, so the two agree only when the
//! root is drawn at its viewBox size.

use kurbo::{Affine, Rect};

use super::svg_tree::{self, SvgTree};
use super::GraphicSurface;
use crate::error::{Result, ViewerError};
use crate::models::Camera;

#[derive(Debug, Default)]
pub struct MemorySurface {
    tree: Option<SvgTree>,
    error_message: Option<String>,
    /// Every camera application, oldest first
    applied: Vec<(Camera, String)>,
    reflows: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> Option<&SvgTree> {
        self.tree.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn applied_transforms(&self) -> &[(Camera, String)] {
        &self.applied
    }

    pub fn last_transition(&self) -> Option<&str> {
        self.applied.last().map(|(_, t)| t.as_str())
    }

    pub fn reflow_count(&self) -> usize {
        self.reflows
    }

    /// Text of the first `tspan` under the member's `part_class` element
    pub fn member_text(&self, id: &str, part_class: &str) -> Option<String> {
        let tree = self.tree.as_ref()?;
        let tspan = Self::member_part(tree, id, part_class, Some("tspan"))?;
        Some(tree.text_content(tspan))
    }

    pub fn member_image(&self, id: &str) -> Option<String> {
        let tree = self.tree.as_ref()?;
        let image = Self::member_part(tree, id, "img-container", None)?;
        tree.element(image)?.href().map(str::to_string)
    }

    fn member_part(tree: &SvgTree, id: &str, class: &str, child: Option<&str>) -> Option<usize> {
        let member = tree.find_by_id(id)?;
        let part = tree.find_descendant_with_class(member, class)?;
        match child {
            Some(local) => tree.find_descendant_named(part, local),
            None => Some(part),
        }
    }

    fn with_element<R>(&mut self, id: &str, f: impl FnOnce(&mut svg_tree::Element) -> R) -> Option<R> {
        let tree = self.tree.as_mut()?;
        let node = tree.find_by_id(id)?;
        tree.element_mut(node).map(f)
    }
}

impl GraphicSurface for MemorySurface {
    fn mount(&mut self, markup: &str) -> Result<()> {
        let tree = SvgTree::parse(markup)?;
        self.tree = Some(tree);
        self.error_message = None;
        self.applied.clear();
        Ok(())
    }

    fn show_error(&mut self, message: &str) {
        self.tree = None;
        self.error_message = Some(message.to_string());
    }

    fn is_mounted(&self) -> bool {
        self.tree.is_some()
    }

    fn contains(&self, id: &str) -> bool {
        self.tree.as_ref().is_some_and(|t| t.find_by_id(id).is_some())
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.tree
            .as_ref()
            .and_then(|t| t.find_by_id(id).and_then(|n| t.element(n)))
            .is_some_and(|el| el.has_class(class))
    }

    fn add_class(&mut self, id: &str, class: &str) -> bool {
        self.with_element(id, |el| {
            el.add_class(class);
        })
        .is_some()
    }

    fn remove_class(&mut self, id: &str, class: &str) -> bool {
        self.with_element(id, |el| {
            el.remove_class(class);
        })
        .is_some()
    }

    fn ids_with_class(&self, class: &str) -> Vec<String> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        tree.elements()
            .filter(|(_, el)| el.has_class(class))
            .filter_map(|(_, el)| el.attr("id"))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn bbox(&self, id: &str) -> Option<Rect> {
        let tree = self.tree.as_ref()?;
        tree.bbox(tree.find_by_id(id)?)
    }

    fn ctm(&self, id: &str) -> Option<Affine> {
        let tree = self.tree.as_ref()?;
        tree.ctm(tree.find_by_id(id)?)
    }

    fn apply_transform(&mut self, camera: &Camera, transition: &str) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        let root = tree.root();
        if let Some(el) = tree.element_mut(root) {
            let style = el.attr("style").unwrap_or("").to_string();
            let style = svg_tree::set_style_property(&style, "transition", transition);
            let style = svg_tree::set_style_property(&style, "transform-origin", "0 0");
            let style = svg_tree::set_style_property(&style, "transform", &camera.to_css());
            el.set_attr("style", style);
        }
        self.applied.push((*camera, transition.to_string()));
    }

    fn force_reflow(&mut self, _id: &str) {
        self.reflows += 1;
    }

    fn set_member_image(&mut self, id: &str, href: &str) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        let Some(image) = Self::member_part(tree, id, "img-container", None) else {
            return false;
        };
        match tree.element_mut(image) {
            Some(el) => {
                // SVG 2 `href` wins when it is the only one present
                if el.attr("href").is_some() && el.attr("xlink:href").is_none() {
                    el.set_attr("href", href);
                } else {
                    el.set_attr("xlink:href", href);
                }
                true
            }
            None => false,
        }
    }

    fn set_member_text(&mut self, id: &str, part_class: &str, text: &str) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        match Self::member_part(tree, id, part_class, Some("tspan")) {
            Some(tspan) => {
                tree.set_text(tspan, text);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Result<String> {
        self.tree.as_ref().ok_or(ViewerError::NotLoaded)?.to_markup()
    }
}
