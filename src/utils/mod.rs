pub mod files;
pub mod text;
pub mod validation;
