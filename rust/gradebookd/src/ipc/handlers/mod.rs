pub mod categories;
pub mod core;
pub mod grades;
pub mod settings;
pub mod ui_state;
