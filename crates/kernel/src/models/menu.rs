//! Navigation menus and their items.
//!
//! Each menu occupies one placement location (header, footer, sidebar,
//! mobile). Items form a tree through the optional `parent_id` and point at
//! site content through a type tag plus `target_id`, or at a raw URL for
//! links.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::validate::{double_option, validate_link_url};

/// Raised when a stored or supplied enum value is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Placement slot for a navigation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    Header,
    Footer,
    Sidebar,
    Mobile,
}

impl MenuLocation {
    pub const ALL: [MenuLocation; 4] = [
        MenuLocation::Header,
        MenuLocation::Footer,
        MenuLocation::Sidebar,
        MenuLocation::Mobile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MenuLocation::Header => "header",
            MenuLocation::Footer => "footer",
            MenuLocation::Sidebar => "sidebar",
            MenuLocation::Mobile => "mobile",
        }
    }
}

impl fmt::Display for MenuLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuLocation {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MenuLocation::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "menu location",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for MenuLocation {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What a menu item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemType {
    Page,
    Category,
    Level,
    Country,
    Scholarship,
    Post,
    Link,
}

impl MenuItemType {
    pub const ALL: [MenuItemType; 7] = [
        MenuItemType::Page,
        MenuItemType::Category,
        MenuItemType::Level,
        MenuItemType::Country,
        MenuItemType::Scholarship,
        MenuItemType::Post,
        MenuItemType::Link,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MenuItemType::Page => "page",
            MenuItemType::Category => "category",
            MenuItemType::Level => "level",
            MenuItemType::Country => "country",
            MenuItemType::Scholarship => "scholarship",
            MenuItemType::Post => "post",
            MenuItemType::Link => "link",
        }
    }

    /// Every type except `link` references a stored entity.
    pub fn needs_target(self) -> bool {
        self != MenuItemType::Link
    }
}

impl fmt::Display for MenuItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuItemType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MenuItemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "menu item type",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for MenuItemType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Menu record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: i32,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub location: MenuLocation,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a menu.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenu {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub location: MenuLocation,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreateMenu {
    pub fn into_record(self) -> Menu {
        let now = Utc::now();
        Menu {
            id: 0,
            name: self.name,
            location: self.location,
            description: self.description,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a menu.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenu {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub location: Option<MenuLocation>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateMenu {
    pub fn apply(self, menu: &mut Menu) {
        if let Some(name) = self.name {
            menu.name = name;
        }
        if let Some(location) = self.location {
            menu.location = location;
        }
        if let Some(description) = self.description {
            menu.description = description;
        }
        if let Some(is_active) = self.is_active {
            menu.is_active = is_active;
        }
        menu.updated_at = Utc::now();
    }
}

/// Menu item record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i32,
    pub menu_id: i32,
    pub parent_id: Option<i32>,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub item_type: MenuItemType,
    /// Referenced entity for every type except `link`.
    pub target_id: Option<i32>,
    /// Raw destination for `link` items.
    pub url: Option<String>,
    pub icon: Option<String>,
    pub open_in_new_tab: bool,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Check that the type tag and its target agree.
    pub fn check_target(&self) -> Result<(), String> {
        if self.item_type.needs_target() && self.target_id.is_none() {
            return Err(format!("{} items require a targetId", self.item_type));
        }
        if self.item_type.needs_target() && self.url.is_some() {
            return Err(format!("{} items cannot carry a url", self.item_type));
        }
        if !self.item_type.needs_target() && self.target_id.is_some() {
            return Err("link items cannot carry a targetId".to_string());
        }
        Ok(())
    }
}

/// Input for creating a menu item. `menu_id` comes from the route.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItem {
    pub parent_id: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: MenuItemType,
    pub target_id: Option<i32>,
    #[validate(length(max = 1000), custom(function = "validate_link_url"))]
    pub url: Option<String>,
    #[validate(length(max = 255))]
    pub icon: Option<String>,
    #[serde(default)]
    pub open_in_new_tab: bool,
    #[serde(default, rename = "order")]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreateMenuItem {
    pub fn into_record(self, menu_id: i32) -> MenuItem {
        let now = Utc::now();
        MenuItem {
            id: 0,
            menu_id,
            parent_id: self.parent_id,
            title: self.title,
            item_type: self.item_type,
            target_id: self.target_id,
            url: self.url,
            icon: self.icon,
            open_in_new_tab: self.open_in_new_tab,
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a menu item.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItem {
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i32>>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<MenuItemType>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    pub open_in_new_tab: Option<bool>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateMenuItem {
    /// Link URLs inside the double option are not reachable by the derive.
    pub fn check_url(&self) -> Result<(), validator::ValidationError> {
        match &self.url {
            Some(Some(url)) => validate_link_url(url),
            _ => Ok(()),
        }
    }

    pub fn apply(self, item: &mut MenuItem) {
        if let Some(parent_id) = self.parent_id {
            item.parent_id = parent_id;
        }
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
        if let Some(target_id) = self.target_id {
            item.target_id = target_id;
        }
        if let Some(url) = self.url {
            item.url = url;
        }
        if let Some(icon) = self.icon {
            item.icon = icon;
        }
        if let Some(open_in_new_tab) = self.open_in_new_tab {
            item.open_in_new_tab = open_in_new_tab;
        }
        if let Some(sort_order) = self.sort_order {
            item.sort_order = sort_order;
        }
        if let Some(is_active) = self.is_active {
            item.is_active = is_active;
        }
        item.updated_at = Utc::now();
    }
}

fn default_true() -> bool {
    true
}
