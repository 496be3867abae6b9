pub mod console;
pub mod validation;
