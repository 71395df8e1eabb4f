pub mod areas;
pub mod auth;
pub mod categories;
pub mod common;
pub mod items;
pub mod postcodes;
pub mod time_slots;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::mailer::Mailer;
use crate::services::{
    areas::AreaService, categories::CategoryService, items::ItemService,
    postcodes::PostcodeService, time_slots::TimeSlotService, users::UserService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub areas: Arc<AreaService>,
    pub time_slots: Arc<TimeSlotService>,
    pub postcodes: Arc<PostcodeService>,
    pub categories: Arc<CategoryService>,
    pub items: Arc<ItemService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, auth: Arc<AuthService>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            areas: Arc::new(AreaService::new(db.clone())),
            time_slots: Arc::new(TimeSlotService::new(db.clone())),
            postcodes: Arc::new(PostcodeService::new(db.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            items: Arc::new(ItemService::new(db.clone())),
            users: Arc::new(UserService::new(db, auth, mailer)),
        }
    }
}
