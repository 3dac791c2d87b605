//! `CodeDocument` implementation over the browser DOM.
//!
//! Markers are `<span>` elements carrying the configured marker attribute
//! (`data-rust-type` by default) plus a pointer cursor, so they work the same
//! whether they were highlighter spans tagged in place or newly created.

use rdocs_core::{CodeDocument, HostError, Rect, Segment, Size, TooltipConfig};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, NodeList, Text};

/// `NodeFilter.SHOW_TEXT`.
const SHOW_TEXT: u32 = 0x4;

/// Browser-backed document host for the annotator.
pub struct BrowserDom {
    document: Document,
    code_selector: String,
    marker_attribute: String,
    processed_attribute: String,
}

impl BrowserDom {
    pub fn new(document: Document, config: &TooltipConfig) -> Self {
        Self {
            document,
            code_selector: config.code_selector.clone(),
            marker_attribute: config.marker_attribute.clone(),
            processed_attribute: config.processed_attribute.clone(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Find the marker element at or above `target`.
pub fn find_marker(
    target: Option<web_sys::EventTarget>,
    marker_attribute: &str,
) -> Option<(Element, String)> {
    let element = target?.dyn_into::<Element>().ok()?;
    let marker = element
        .closest(&format!("[{marker_attribute}]"))
        .ok()
        .flatten()?;
    let token = marker.get_attribute(marker_attribute)?;
    Some((marker, token))
}

/// Viewport rectangle of a marker, or `None` if it has left the document.
pub fn anchor_rect(element: &Element) -> Option<Rect> {
    if !element.is_connected() {
        return None;
    }
    let rect = element.get_bounding_client_rect();
    Some(Rect::new(rect.x(), rect.y(), rect.width(), rect.height()))
}

/// Current viewport size.
pub fn viewport_size() -> Size {
    let Some(window) = web_sys::window() else {
        return Size::default();
    };
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or_default();
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or_default();
    Size::new(width, height)
}

fn host_error(e: JsValue) -> HostError {
    HostError(format!("{:?}", e))
}

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn style_marker(element: &Element) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let style = html.style();
        let _ = style.set_property("cursor", "pointer");
        let _ = style.set_property("border-radius", "2px");
    }
}

impl CodeDocument for BrowserDom {
    type Element = Element;
    type TextNode = Text;

    fn code_regions(&self, root: &Element) -> Vec<Element> {
        match root.query_selector_all(&self.code_selector) {
            Ok(list) => elements(&list),
            Err(e) => {
                tracing::warn!("code selector query failed: {:?}", e);
                Vec::new()
            }
        }
    }

    fn is_processed(&self, region: &Element) -> bool {
        region.has_attribute(&self.processed_attribute)
    }

    fn mark_processed(&mut self, region: &Element) -> Result<(), HostError> {
        region
            .set_attribute(&self.processed_attribute, "true")
            .map_err(host_error)
    }

    fn inline_fragments(&self, region: &Element) -> Vec<Element> {
        region
            .query_selector_all("span")
            .map(|list| elements(&list))
            .unwrap_or_default()
    }

    fn element_text(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn marker_token(&self, element: &Element) -> Option<String> {
        element.get_attribute(&self.marker_attribute)
    }

    fn tag_marker(&mut self, element: &Element, token: &str) -> Result<(), HostError> {
        element
            .set_attribute(&self.marker_attribute, token)
            .map_err(host_error)?;
        style_marker(element);
        Ok(())
    }

    fn text_nodes(&self, region: &Element) -> Vec<Text> {
        let walker = match self
            .document
            .create_tree_walker_with_what_to_show(region, SHOW_TEXT)
        {
            Ok(walker) => walker,
            Err(e) => {
                tracing::warn!("create_tree_walker failed: {:?}", e);
                return Vec::new();
            }
        };

        let mut nodes = Vec::new();
        while let Ok(Some(node)) = walker.next_node() {
            if let Ok(text) = node.dyn_into::<Text>() {
                nodes.push(text);
            }
        }
        nodes
    }

    fn text_data(&self, node: &Text) -> String {
        node.text_content().unwrap_or_default()
    }

    fn text_parent(&self, node: &Text) -> Option<Element> {
        node.parent_element()
    }

    fn replace_text(&mut self, node: &Text, segments: &[Segment<'_>]) -> Result<(), HostError> {
        let parent = node.parent_node().ok_or("detached text node")?;
        let fragment = self.document.create_document_fragment();

        for segment in segments {
            match *segment {
                Segment::Text(text) => {
                    let text_node = self.document.create_text_node(text);
                    fragment.append_child(&text_node).map_err(host_error)?;
                }
                Segment::Marker(token) => {
                    let span = self.document.create_element("span").map_err(host_error)?;
                    span.set_text_content(Some(token));
                    span.set_attribute(&self.marker_attribute, token)
                        .map_err(host_error)?;
                    style_marker(&span);
                    fragment.append_child(&span).map_err(host_error)?;
                }
            }
        }

        parent.replace_child(&fragment, node).map_err(host_error)?;
        Ok(())
    }
}
