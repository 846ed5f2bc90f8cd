//! Domain services sitting between the routes and storage.
//!
//! Services own validation that spans records (name clashes, cycles,
//! the single default role) and keep their caches in step with writes.

pub mod menu;
pub mod roles;
pub mod settings;

pub use menu::{MenuNode, MenuService, MenuStructure};
pub use roles::RoleService;
pub use settings::SiteSettingsService;
