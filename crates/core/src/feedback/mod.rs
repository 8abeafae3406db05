pub mod announcement;
pub mod domain;
pub mod feedback_debouncer;
pub mod infrastructure;
