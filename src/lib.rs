//! Students API: REST backend for courses and the students enrolled in them.

pub mod error;
pub mod handlers;
pub mod model;
pub mod routes;
pub mod service;
pub mod settings;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, StartupError};
pub use model::{Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
pub use routes::{api_routes, app, common_routes};
pub use service::{CourseService, StudentService};
pub use settings::{Settings, StoreKind};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, MemoryStore, PgStore, Store};
