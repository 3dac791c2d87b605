//! In-memory document tree for annotator tests.
//!
//! Parses a tiny HTML subset (elements, attributes, text, `&lt;` style
//! entities) and serializes back to the same form, so tests can compare
//! markup before and after a scan.

use super::{CodeDocument, Segment};
use crate::error::HostError;

pub(crate) const MARKER_ATTR: &str = "data-rust-type";
pub(crate) const PROCESSED_ATTR: &str = "data-tooltips-processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

#[derive(Debug, Clone)]
enum Kind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: Kind,
}

#[derive(Debug, Clone)]
pub(crate) struct MockDocument {
    nodes: Vec<Node>,
    /// Fail `replace_text` for text nodes containing this string.
    pub(crate) fail_replace_containing: Option<String>,
}

impl MockDocument {
    /// Parse markup under a synthetic `<body>` root.
    pub(crate) fn parse(html: &str) -> (Self, NodeId) {
        let mut doc = Self {
            nodes: Vec::new(),
            fail_replace_containing: None,
        };
        let root = doc.push(None, element("body", Vec::new()));
        let mut stack = vec![root];
        let mut rest = html;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').expect("unterminated close tag");
                rest = &after[end + 1..];
                stack.pop();
            } else if let Some(after) = rest.strip_prefix('<') {
                let end = after.find('>').expect("unterminated open tag");
                let (tag, attrs) = parse_open_tag(&after[..end]);
                rest = &after[end + 1..];
                let parent = *stack.last().expect("stack underflow");
                let id = doc.push(Some(parent), element(&tag, attrs));
                stack.push(id);
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let parent = *stack.last().expect("stack underflow");
                doc.push(Some(parent), Kind::Text(decode(&rest[..end])));
                rest = &rest[end..];
            }
        }

        (doc, root)
    }

    /// Serialize the children of `root`.
    pub(crate) fn to_html(&self, root: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(root) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Tokens of all markers below `root`, in document order.
    pub(crate) fn markers(&self, root: NodeId) -> Vec<String> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| self.attr(id, MARKER_ATTR).map(str::to_owned))
            .collect()
    }

    /// Append markup as new children of `root`, simulating late-loaded content.
    pub(crate) fn append_html(&mut self, root: NodeId, html: &str) {
        let (other, other_root) = Self::parse(html);
        let offset = self.nodes.len();
        let remap = |id: NodeId| NodeId(id.0 + offset - 1);

        for (i, node) in other.nodes.iter().enumerate().skip(1) {
            let kind = match &node.kind {
                Kind::Element {
                    tag,
                    attrs,
                    children,
                } => Kind::Element {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                    children: children.iter().map(|&c| remap(c)).collect(),
                },
                Kind::Text(t) => Kind::Text(t.clone()),
            };
            let parent = match node.parent {
                Some(p) if p == other_root => Some(root),
                Some(p) => Some(remap(p)),
                None => None,
            };
            debug_assert_eq!(self.nodes.len(), i + offset - 1);
            self.nodes.push(Node { parent, kind });
        }

        let top: Vec<NodeId> = other.children(other_root).iter().map(|&c| remap(c)).collect();
        if let Kind::Element { children, .. } = &mut self.nodes[root.0].kind {
            children.extend(top);
        }
    }

    fn push(&mut self, parent: Option<NodeId>, kind: Kind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent, kind });
        if let Some(p) = parent {
            if let Kind::Element { children, .. } = &mut self.nodes[p.0].kind {
                children.push(id);
            }
        }
        id
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            Kind::Element { children, .. } => children,
            Kind::Text(_) => &[],
        }
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            Kind::Element { tag, .. } => Some(tag),
            Kind::Text(_) => None,
        }
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            Kind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Kind::Text(_) => None,
        }
    }

    fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Kind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_owned(),
                None => attrs.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &child in self.children(id) {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            Kind::Text(t) => out.push_str(&encode(t)),
            Kind::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push_str(&format!(" {k}=\"{v}\""));
                }
                out.push('>');
                for &child in children {
                    self.write_node(child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

impl CodeDocument for MockDocument {
    type Element = NodeId;
    type TextNode = NodeId;

    fn code_regions(&self, root: &NodeId) -> Vec<NodeId> {
        self.descendants(*root)
            .into_iter()
            .filter(|&id| self.tag(id) == Some("pre"))
            .collect()
    }

    fn is_processed(&self, region: &NodeId) -> bool {
        self.attr(*region, PROCESSED_ATTR).is_some()
    }

    fn mark_processed(&mut self, region: &NodeId) -> Result<(), HostError> {
        self.set_attr(*region, PROCESSED_ATTR, "true");
        Ok(())
    }

    fn inline_fragments(&self, region: &NodeId) -> Vec<NodeId> {
        self.descendants(*region)
            .into_iter()
            .filter(|&id| self.tag(id) == Some("span"))
            .collect()
    }

    fn element_text(&self, element: &NodeId) -> String {
        self.descendants(*element)
            .into_iter()
            .filter_map(|id| match &self.nodes[id.0].kind {
                Kind::Text(t) => Some(t.as_str()),
                Kind::Element { .. } => None,
            })
            .collect()
    }

    fn marker_token(&self, element: &NodeId) -> Option<String> {
        self.attr(*element, MARKER_ATTR).map(str::to_owned)
    }

    fn tag_marker(&mut self, element: &NodeId, token: &str) -> Result<(), HostError> {
        self.set_attr(*element, MARKER_ATTR, token);
        Ok(())
    }

    fn text_nodes(&self, region: &NodeId) -> Vec<NodeId> {
        self.descendants(*region)
            .into_iter()
            .filter(|&id| matches!(self.nodes[id.0].kind, Kind::Text(_)))
            .collect()
    }

    fn text_data(&self, node: &NodeId) -> String {
        match &self.nodes[node.0].kind {
            Kind::Text(t) => t.clone(),
            Kind::Element { .. } => String::new(),
        }
    }

    fn text_parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn replace_text(&mut self, node: &NodeId, segments: &[Segment<'_>]) -> Result<(), HostError> {
        if let Some(needle) = &self.fail_replace_containing {
            if self.text_data(node).contains(needle.as_str()) {
                return Err("replace rejected".into());
            }
        }

        let parent = self.nodes[node.0].parent.ok_or("detached text node")?;

        let mut replacement = Vec::with_capacity(segments.len());
        for segment in segments {
            let id = match *segment {
                Segment::Text(text) => self.detached(parent, Kind::Text(text.to_owned())),
                Segment::Marker(token) => {
                    let span = self.detached(
                        parent,
                        element("span", vec![(MARKER_ATTR.to_owned(), token.to_owned())]),
                    );
                    let text = self.detached(span, Kind::Text(token.to_owned()));
                    if let Kind::Element { children, .. } = &mut self.nodes[span.0].kind {
                        children.push(text);
                    }
                    span
                }
            };
            replacement.push(id);
        }

        let Kind::Element { children, .. } = &mut self.nodes[parent.0].kind else {
            return Err("text parent is not an element".into());
        };
        let pos = children
            .iter()
            .position(|&c| c == *node)
            .ok_or("text node not found in parent")?;
        children.splice(pos..=pos, replacement);
        self.nodes[node.0].parent = None;
        Ok(())
    }
}

impl MockDocument {
    fn detached(&mut self, parent: NodeId, kind: Kind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            kind,
        });
        id
    }
}

fn element(tag: &str, attrs: Vec<(String, String)>) -> Kind {
    Kind::Element {
        tag: tag.to_owned(),
        attrs,
        children: Vec::new(),
    }
}

fn parse_open_tag(src: &str) -> (String, Vec<(String, String)>) {
    let src = src.trim();
    let (tag, mut rest) = src.split_at(src.find(' ').unwrap_or(src.len()));
    let mut attrs = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let name_end = rest.find(['=', ' ']).unwrap_or(rest.len());
        let name = rest[..name_end].to_owned();
        rest = &rest[name_end..];
        if let Some(after) = rest.strip_prefix("=\"") {
            let end = after.find('"').expect("unterminated attribute");
            attrs.push((name, decode(&after[..end])));
            rest = &after[end + 1..];
        } else {
            attrs.push((name, String::new()));
        }
    }

    (tag.to_owned(), attrs)
}

fn decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn encode(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
