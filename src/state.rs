//! Shared application state for all routes.

use crate::settings::Settings;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub max_students_per_course: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: &Settings) -> Self {
        Self {
            store,
            max_students_per_course: settings.max_students_per_course,
        }
    }
}
