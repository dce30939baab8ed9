//! DOM rendering for the picker menu.
//!
//! The view is dumb: it draws a [`PickerMenu`] and classifies clicks. State
//! changes go through the session's picker.

use emojiarea_core::{PickerMenu, PlatformError};
use smol_str::SmolStr;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::dom::ICON_CLASS;

pub const MENU_CLASS: &str = "emojiarea-menu";

/// What a click inside the menu hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuClick {
    Tab(SmolStr),
    Item { group: SmolStr, token: SmolStr },
    Nothing,
}

pub struct MenuView {
    root: HtmlElement,
    document: Document,
}

impl MenuView {
    /// Create the (hidden) menu element at the end of `<body>`.
    pub fn new(document: &Document) -> Result<Self, PlatformError> {
        let root = create(document, "div")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| "menu root is not an HtmlElement")?;
        root.set_class_name(MENU_CLASS);
        set_display(&root, false)?;
        document
            .body()
            .ok_or("no document body")?
            .append_child(&root)
            .map_err(|e| format!("append_child failed: {:?}", e))?;
        Ok(Self {
            root,
            document: document.clone(),
        })
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    /// Redraw tabs and the active group's items.
    pub fn render(&self, menu: &PickerMenu) -> Result<(), PlatformError> {
        self.root.set_text_content(None);

        let tabs = create(&self.document, "div")?;
        tabs.set_class_name("emojiarea-tabs");
        for (i, tab) in menu.tabs().iter().enumerate() {
            let link = create(&self.document, "a")?;
            link.set_class_name(if i == menu.active_index() {
                "emojiarea-tab active"
            } else {
                "emojiarea-tab"
            });
            set_attr(&link, "data-tab", &tab.group)?;
            link.set_text_content(Some(&tab.label));
            append(&tabs, &link)?;
        }
        append(&self.root, &tabs)?;

        let items = create(&self.document, "div")?;
        items.set_class_name("emojiarea-items");
        if let Some(tab) = menu.active_tab() {
            for entry in &tab.entries {
                let link = create(&self.document, "a")?;
                link.set_class_name("emojiarea-item");
                set_attr(&link, "data-group", &tab.group)?;
                set_attr(&link, "data-token", &entry.token)?;
                set_attr(&link, "title", &entry.token)?;

                let img = create(&self.document, "img")?;
                img.set_class_name(ICON_CLASS);
                set_attr(&img, "src", &entry.image.src)?;
                set_attr(&img, "alt", &entry.image.alt)?;
                append(&link, &img)?;
                append(&items, &link)?;
            }
        }
        append(&self.root, &items)?;

        set_display(&self.root, menu.is_visible())
    }

    pub fn hide(&self) -> Result<(), PlatformError> {
        set_display(&self.root, false)
    }

    pub fn remove(&self) {
        self.root.remove();
    }

    /// Classify a click whose target is `target`.
    pub fn classify(&self, target: &Element) -> MenuClick {
        let closest = |selector: &str| target.closest(selector).ok().flatten();
        if let Some(item) = closest("[data-token]") {
            let group = item.get_attribute("data-group").unwrap_or_default();
            let token = item.get_attribute("data-token").unwrap_or_default();
            return MenuClick::Item {
                group: group.into(),
                token: token.into(),
            };
        }
        if let Some(tab) = closest("[data-tab]") {
            return MenuClick::Tab(tab.get_attribute("data-tab").unwrap_or_default().into());
        }
        MenuClick::Nothing
    }
}

fn create(document: &Document, tag: &str) -> Result<Element, PlatformError> {
    document
        .create_element(tag)
        .map_err(|e| format!("create_element({tag}) failed: {:?}", e).into())
}

fn set_attr(element: &Element, name: &str, value: &str) -> Result<(), PlatformError> {
    element
        .set_attribute(name, value)
        .map_err(|e| format!("set_attribute({name}) failed: {:?}", e).into())
}

fn append(parent: &Element, child: &Element) -> Result<(), PlatformError> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|e| format!("append_child failed: {:?}", e).into())
}

fn set_display(element: &HtmlElement, visible: bool) -> Result<(), PlatformError> {
    element
        .style()
        .set_property("display", if visible { "block" } else { "none" })
        .map_err(|e| format!("set_property failed: {:?}", e).into())
}
