//! Course and student services plus request validation.

mod crud;
mod validation;
pub use crud::{CourseService, StudentService};
pub use validation::RequestValidator;
