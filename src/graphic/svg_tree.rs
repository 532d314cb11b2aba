//! Owned, mutable SVG document tree
//!
//! Parsed with quick-xml into a flat node arena so elements can be looked up
//! by id, edited in place and written back out. Names and attributes are kept
//! exactly as written (`xlink:href` stays `xlink:href`); namespace
//! declarations are ordinary attributes here.

use std::borrow::Cow;

use kurbo::{Affine, Point, Rect};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, ViewerError};
use crate::models::geometry;

pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Qualified name as written, e.g. `svg:g` or `rect`
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add `class`; false if it was already present
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
        true
    }

    /// Remove `class`; false if it was not present
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let kept: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        let kept = kept.join(" ");
        self.set_attr("class", kept);
        true
    }

    /// `href`, falling back to the legacy `xlink:href`
    pub fn href(&self) -> Option<&str> {
        self.attr("href").or_else(|| self.attr("xlink:href"))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements whose content is never rendered and so never contributes to a bbox
const NON_RENDERED: &[&str] = &[
    "defs",
    "clipPath",
    "mask",
    "pattern",
    "linearGradient",
    "radialGradient",
    "style",
    "script",
    "title",
    "desc",
    "metadata",
    "symbol",
    "marker",
    "filter",
];

#[derive(Clone, Debug)]
pub struct SvgTree {
    nodes: Vec<Node>,
    root: NodeId,
}

pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| ViewerError::InvalidGraphic(e.to_string()))
}

fn invalid(e: impl std::fmt::Display) -> ViewerError {
    ViewerError::InvalidGraphic(e.to_string())
}

impl SvgTree {
    /// Parse SVG markup. Anything outside the root element is dropped.
    pub fn parse(markup: &str) -> Result<Self> {
        let mut reader = Reader::from_str(markup);
        reader.trim_text(false);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            let event = reader.read_event().map_err(invalid)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if root.is_some() && stack.is_empty() {
                        return Err(invalid("multiple root elements"));
                    }
                    let element = Self::read_element(e)?;
                    let id = nodes.len();
                    nodes.push(Node {
                        kind: NodeKind::Element(element),
                        parent: stack.last().copied(),
                        children: Vec::new(),
                    });
                    match stack.last() {
                        Some(&parent) => nodes[parent].children.push(id),
                        None => root = Some(id),
                    }
                    if !is_empty {
                        stack.push(id);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(e) => {
                    if let Some(&parent) = stack.last() {
                        let text = e.unescape().map_err(invalid)?.into_owned();
                        Self::push_leaf(&mut nodes, parent, NodeKind::Text(text));
                    }
                }
                Event::CData(e) => {
                    if let Some(&parent) = stack.last() {
                        let text = utf8(&e)?.to_string();
                        Self::push_leaf(&mut nodes, parent, NodeKind::CData(text));
                    }
                }
                Event::Comment(e) => {
                    if let Some(&parent) = stack.last() {
                        let text = utf8(&e)?.to_string();
                        Self::push_leaf(&mut nodes, parent, NodeKind::Comment(text));
                    }
                }
                Event::Eof => break,
                // Declaration, doctype and processing instructions are not kept
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(invalid("unexpected end of document"));
        }
        let root = root.ok_or_else(|| invalid("no root element"))?;
        let tree = SvgTree { nodes, root };
        match tree.element(root) {
            Some(el) if el.local_name() == "svg" => Ok(tree),
            Some(el) => Err(invalid(format!("root element is <{}>, expected <svg>", el.name))),
            None => Err(invalid("no root element")),
        }
    }

    fn read_element(e: &BytesStart<'_>) -> Result<Element> {
        let name = utf8(e.name().as_ref())?.to_string();
        let mut element = Element::new(&name);
        for attr in e.attributes() {
            let attr = attr.map_err(invalid)?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value().map_err(invalid)?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn push_leaf(nodes: &mut Vec<Node>, parent: NodeId, kind: NodeKind) {
        let id = nodes.len();
        nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        nodes[parent].children.push(id);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node).map(|n| &n.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.nodes.get(node).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children only
    pub fn child_elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(move |&c| self.element(c).is_some())
    }

    /// `node` and all its descendants in document order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = (NodeId, &Element)> + '_ {
        self.descendants(self.root)
            .into_iter()
            .filter_map(move |n| self.element(n).map(|el| (n, el)))
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .find(|(_, el)| el.attr("id") == Some(id))
            .map(|(n, _)| n)
    }

    pub fn elements_named(&self, local: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|(_, el)| el.local_name() == local)
            .map(|(n, _)| n)
            .collect()
    }

    /// First descendant of `scope` (excluding itself) that has `class`
    pub fn find_descendant_with_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .skip(1)
            .find(|&n| self.element(n).is_some_and(|el| el.has_class(class)))
    }

    /// First descendant of `scope` (excluding itself) with local name `local`
    pub fn find_descendant_named(&self, scope: NodeId, local: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .skip(1)
            .find(|&n| self.element(n).is_some_and(|el| el.local_name() == local))
    }

    /// Replace the children of `node` with a single text node
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if self.element(node).is_none() {
            return;
        }
        self.nodes[node].children.clear();
        Self::push_leaf(&mut self.nodes, node, NodeKind::Text(text.to_string()));
    }

    /// Concatenated text content of `node`
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                Some(NodeKind::Text(t)) | Some(NodeKind::CData(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn append_child(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.insert_child(parent, usize::MAX, element)
    }

    pub fn insert_first_child(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.insert_child(parent, 0, element)
    }

    fn insert_child(&mut self, parent: NodeId, index: usize, element: Element) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind: NodeKind::Element(element),
            parent: Some(parent),
            children: Vec::new(),
        });
        let siblings = &mut self.nodes[parent].children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        id
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// The element's own `transform` attribute; unparsable lists are ignored
    pub fn local_transform(&self, node: NodeId) -> Affine {
        let Some(value) = self.element(node).and_then(|el| el.attr("transform")) else {
            return Affine::IDENTITY;
        };
        geometry::parse_transform(value).unwrap_or_else(|| {
            log::warn!("Ignoring unparsable transform \"{}\"", value);
            Affine::IDENTITY
        })
    }

    /// Cumulative transform from the element's user space to root user space.
    ///
    /// The root's own `viewBox` mapping is not included.
    pub fn ctm(&self, node: NodeId) -> Option<Affine> {
        self.element(node)?;
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.root {
                break;
            }
            chain.push(n);
            current = self.parent(n);
        }
        Some(
            chain
                .iter()
                .rev()
                .fold(Affine::IDENTITY, |acc, &n| acc * self.local_transform(n)),
        )
    }

    /// Bounding box in the element's own user space (its transform excluded)
    pub fn bbox(&self, node: NodeId) -> Option<Rect> {
        let el = self.element(node)?;
        let local = el.local_name();
        if NON_RENDERED.contains(&local) {
            return None;
        }
        let num = |name: &str| {
            el.attr(name)
                .and_then(geometry::parse_length)
                .unwrap_or(0.0)
        };

        let own = match local {
            "rect" | "image" | "use" | "foreignObject" => Some(Rect::from_origin_size(
                (num("x"), num("y")),
                (num("width").max(0.0), num("height").max(0.0)),
            )),
            "circle" => {
                let r = num("r").max(0.0);
                Some(Rect::from_center_size((num("cx"), num("cy")), (2.0 * r, 2.0 * r)))
            }
            "ellipse" => Some(Rect::from_center_size(
                (num("cx"), num("cy")),
                (2.0 * num("rx").max(0.0), 2.0 * num("ry").max(0.0)),
            )),
            "line" => Some(Rect::from_points((num("x1"), num("y1")), (num("x2"), num("y2")))),
            "polyline" | "polygon" => {
                geometry::bounds_of(&geometry::parse_points(el.attr("points").unwrap_or("")))
            }
            "path" => geometry::bounds_of(&geometry::path_points(el.attr("d").unwrap_or(""))),
            "text" | "tspan" if el.attr("x").is_some() || el.attr("y").is_some() => {
                let p = Point::new(num("x"), num("y"));
                Some(Rect::from_points(p, p))
            }
            _ => None,
        };

        if node != self.root && local == "svg" {
            return own.or_else(|| {
                Some(Rect::from_origin_size((num("x"), num("y")), (num("width"), num("height"))))
            });
        }

        self.child_elements(node)
            .filter_map(|child| {
                let b = self.bbox(child)?;
                Some(self.local_transform(child).transform_rect_bbox(b))
            })
            .fold(own, |acc, b| Some(acc.map_or(b, |a| a.union(b))))
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Serialize the root element (no XML declaration)
    pub fn to_markup(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_node(&mut writer, self.root)?;
        String::from_utf8(writer.into_inner()).map_err(|e| ViewerError::Serialize(e.to_string()))
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, node: NodeId) -> Result<()> {
        match &self.nodes[node].kind {
            NodeKind::Element(el) => {
                let mut start = BytesStart::new(el.name.as_str());
                for (k, v) in &el.attributes {
                    start.push_attribute((k.as_str(), v.as_str()));
                }
                let children = &self.nodes[node].children;
                if children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for &child in children {
                        self.write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
                }
            }
            NodeKind::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            NodeKind::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
            NodeKind::Comment(t) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(Cow::Borrowed(t.as_str()))))?
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Inline style declarations
// ----------------------------------------------------------------------

/// Split a `style` attribute into `(property, value)` pairs
pub fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

pub fn join_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{}: {};", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set (or replace) one property in a style attribute value
pub fn set_style_property(style: &str, property: &str, value: &str) -> String {
    let mut decls = style_declarations(style);
    match decls.iter_mut().find(|(k, _)| k == property) {
        Some(slot) => slot.1 = value.to_string(),
        None => decls.push((property.to_string(), value.to_string())),
    }
    join_declarations(&decls)
}

/// Remove the given properties from a style attribute value
pub fn remove_style_properties(style: &str, properties: &[&str]) -> String {
    let decls: Vec<(String, String)> = style_declarations(style)
        .into_iter()
        .filter(|(k, _)| !properties.contains(&k.as_str()))
        .collect();
    join_declarations(&decls)
}
