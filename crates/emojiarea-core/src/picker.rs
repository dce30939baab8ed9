//! Picker menu model.
//!
//! One tab per catalog group, first group active. The menu holds no reference
//! to the session: [`PickerMenu::choose`] hands back a [`PickerChoice`] and the
//! session decides what to do with it.

use smol_str::SmolStr;

use crate::catalog::{ImageHandle, PictogramCatalog};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    /// Full token, e.g. `:smile:`.
    pub token: SmolStr,
    pub image: ImageHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerTab {
    pub group: SmolStr,
    pub label: SmolStr,
    pub entries: Vec<PickerEntry>,
}

/// A pictogram picked from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerChoice {
    pub group: SmolStr,
    pub token: SmolStr,
}

/// Keys the menu reacts to while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKey {
    Escape,
    Tab,
    Other,
}

impl PickerKey {
    /// From a DOM `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => PickerKey::Escape,
            "Tab" => PickerKey::Tab,
            _ => PickerKey::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerMenu {
    tabs: Vec<PickerTab>,
    active: usize,
    visible: bool,
}

impl PickerMenu {
    pub fn new(catalog: &PictogramCatalog) -> Self {
        let tabs = catalog
            .groups()
            .iter()
            .map(|group| PickerTab {
                group: group.id.clone(),
                label: group.name.clone(),
                entries: group
                    .icons
                    .iter()
                    .map(|p| PickerEntry {
                        token: p.image.alt.clone(),
                        image: p.image.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            tabs,
            active: 0,
            visible: false,
        }
    }

    pub fn tabs(&self) -> &[PickerTab] {
        &self.tabs
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> Option<&PickerTab> {
        self.tabs.get(self.active)
    }

    /// Switch tabs. Unknown groups leave the active tab alone.
    pub fn select_group(&mut self, group: &str) -> bool {
        match self.tabs.iter().position(|t| t.group == group) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns true when the key closed the menu.
    pub fn handle_key(&mut self, key: PickerKey) -> bool {
        match key {
            PickerKey::Escape | PickerKey::Tab if self.visible => {
                self.hide();
                true
            }
            _ => false,
        }
    }

    /// Pick `token` from `group`. `None` when the menu has no such entry.
    pub fn choose(&self, group: &str, token: &str) -> Option<PickerChoice> {
        let body = crate::catalog::token_body(token);
        let tab = self.tabs.iter().find(|t| t.group == group)?;
        let entry = tab
            .entries
            .iter()
            .find(|e| crate::catalog::token_body(&e.token) == body)?;
        Some(PickerChoice {
            group: tab.group.clone(),
            token: entry.token.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    fn menu() -> PickerMenu {
        let config = CatalogConfig::from_toml_str(
            r#"
            [[groups]]
            id = "people"
            name = "People"
            icons = { smile = "smile.png", wink = "wink.png" }

            [[groups]]
            id = "nature"
            icons = { sun = "sun.png" }
            "#,
        )
        .unwrap();
        PickerMenu::new(&PictogramCatalog::from_config(&config).unwrap())
    }

    #[test]
    fn test_first_group_active_and_hidden() {
        let menu = menu();
        assert_eq!(menu.tabs().len(), 2);
        assert_eq!(menu.active_tab().unwrap().label, "People");
        assert!(!menu.is_visible());
    }

    #[test]
    fn test_select_group() {
        let mut menu = menu();
        assert!(menu.select_group("nature"));
        assert_eq!(menu.active_index(), 1);
        assert!(!menu.select_group("food"));
        assert_eq!(menu.active_index(), 1);
    }

    #[test]
    fn test_escape_and_tab_hide() {
        let mut menu = menu();
        assert!(!menu.handle_key(PickerKey::Escape));
        menu.show();
        assert!(!menu.handle_key(PickerKey::Other));
        assert!(menu.handle_key(PickerKey::from_key("Escape")));
        assert!(!menu.is_visible());
        menu.show();
        assert!(menu.handle_key(PickerKey::from_key("Tab")));
    }

    #[test]
    fn test_choose() {
        let menu = menu();
        let choice = menu.choose("people", "wink").unwrap();
        assert_eq!(choice.token, ":wink:");
        assert_eq!(menu.choose("people", ":wink:"), Some(choice));
        assert_eq!(menu.choose("nature", "wink"), None);
        assert_eq!(menu.choose("food", "sun"), None);
    }

    #[test]
    fn test_empty_catalog() {
        let menu = PickerMenu::new(&PictogramCatalog::empty());
        assert!(menu.tabs().is_empty());
        assert!(menu.active_tab().is_none());
    }
}
