//! The single tooltip element.
//!
//! `TooltipView` only renders what the controller decided; it never changes
//! tooltip state. Content is built with DOM calls, never `innerHTML`, so
//! dictionary text cannot inject markup.

use std::cell::RefCell;

use rdocs_core::{SmolStr, TermEntry, TooltipConfig, TooltipState};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

pub struct TooltipView {
    document: Document,
    element: HtmlElement,
    config: TooltipConfig,
    /// Token whose content is currently in the element.
    rendered: RefCell<Option<SmolStr>>,
}

impl TooltipView {
    /// Create the tooltip element and append it to `<body>`, hidden.
    pub fn create(document: &Document, config: &TooltipConfig) -> Result<Self, JsValue> {
        let element = document
            .create_element("div")?
            .dyn_into::<HtmlElement>()?;
        element.set_class_name(&config.tooltip_class);
        element.set_attribute("role", "tooltip")?;

        let style = element.style();
        style.set_property("position", "fixed")?;
        style.set_property("z-index", "100")?;
        style.set_property("width", &format!("{}px", config.geometry.width))?;
        style.set_property("display", "none")?;

        let body = document.body().ok_or("document has no body")?;
        body.append_child(&element)?;

        Ok(Self {
            document: document.clone(),
            element,
            config: config.clone(),
            rendered: RefCell::new(None),
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Whether `node` is the tooltip or inside it.
    pub fn contains(&self, node: Option<&Node>) -> bool {
        self.element.contains(node)
    }

    /// Bring the element in line with `state`.
    pub fn render(&self, state: &TooltipState, entry: Option<&TermEntry>) {
        let style = self.element.style();
        let (true, Some(entry)) = (state.visible, entry) else {
            let _ = style.set_property("display", "none");
            return;
        };

        let _ = style.set_property("left", &format!("{}px", state.x));
        let _ = style.set_property("top", &format!("{}px", state.y));

        let stale = self.rendered.borrow().as_ref() != Some(&entry.token);
        if stale {
            if let Err(e) = self.fill(entry) {
                tracing::error!("tooltip render failed: {:?}", e);
            }
            *self.rendered.borrow_mut() = Some(entry.token.clone());
        }

        let _ = style.set_property("display", "block");
    }

    fn fill(&self, entry: &TermEntry) -> Result<(), JsValue> {
        self.element.set_text_content(None);

        let header = self.child("div", "header")?;
        if let Some(icon) = entry.icon.as_deref() {
            let icon_el = self.child("span", "icon")?;
            icon_el.set_attribute("data-icon", icon)?;
            header.append_child(&icon_el)?;
        }
        let name = self.child("strong", "name")?;
        name.set_text_content(Some(&entry.name));
        header.append_child(&name)?;
        let category = self.child("span", "category")?;
        category.set_text_content(Some(entry.category.as_str()));
        header.append_child(&category)?;
        self.element.append_child(&header)?;

        let description = self.child("p", "description")?;
        description.set_text_content(Some(&entry.description));
        self.element.append_child(&description)?;

        if let Some(destination) = entry.destination() {
            let footer = self.child("a", "link")?;
            footer.set_attribute("href", &self.config.link_for(destination))?;
            footer.set_text_content(Some("View docs →"));
            self.element.append_child(&footer)?;
        }
        Ok(())
    }

    fn child(&self, tag: &str, part: &str) -> Result<Element, JsValue> {
        let el = self.document.create_element(tag)?;
        el.set_class_name(&format!("{}__{}", self.config.tooltip_class, part));
        Ok(el)
    }

    /// Detach the element from the document.
    pub fn remove(&self) {
        self.element.remove();
        self.rendered.borrow_mut().take();
    }
}
