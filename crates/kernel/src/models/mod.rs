//! Data models and their create/update payloads.
//!
//! Every record has an auto-increment `i32` identity assigned by the storage
//! backend. Create payloads turn into records via `into_record`; update
//! payloads are partial and merge into an existing record via `apply`.

pub mod media;
pub mod menu;
pub mod page;
pub mod post;
pub mod role;
pub mod scholarship;
pub mod seo;
pub mod site_settings;
pub mod subscriber;
pub mod success_story;
pub mod term;
pub mod user;
pub mod validate;

pub use media::{Media, UpdateMedia};
pub use menu::{
    CreateMenu, CreateMenuItem, Menu, MenuItem, MenuItemType, MenuLocation, ParseEnumError,
    UpdateMenu, UpdateMenuItem,
};
pub use page::{CreatePage, Page, UpdatePage};
pub use post::{CreatePost, Post, PostFilter, UpdatePost};
pub use role::{CreateRole, Role, UpdateRole};
pub use scholarship::{CreateScholarship, Scholarship, ScholarshipFilter, UpdateScholarship};
pub use seo::{CreateSeoSetting, SeoSetting, UpdateSeoSetting};
pub use site_settings::{SiteSettings, UpdateSiteSettings};
pub use subscriber::{CreateSubscriber, Subscriber, UpdateSubscriber};
pub use success_story::{CreateSuccessStory, SuccessStory, UpdateSuccessStory};
pub use term::{CreateTerm, Term, TermKind, UpdateTerm};
pub use user::{CreateUser, UpdateUser, User};

/// A stored row with an integer identity.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> i32;
    fn set_id(&mut self, id: i32);
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                fn id(&self) -> i32 {
                    self.id
                }

                fn set_id(&mut self, id: i32) {
                    self.id = id;
                }
            }
        )*
    };
}

impl_record!(
    Media,
    Menu,
    MenuItem,
    Page,
    Post,
    Role,
    Scholarship,
    SeoSetting,
    SiteSettings,
    Subscriber,
    SuccessStory,
    Term,
    User,
);

/// Row counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub scholarships: i64,
    pub published_scholarships: i64,
    pub posts: i64,
    pub pages: i64,
    pub categories: i64,
    pub levels: i64,
    pub countries: i64,
    pub tags: i64,
    pub success_stories: i64,
    pub subscribers: i64,
    pub media: i64,
    pub users: i64,
}
