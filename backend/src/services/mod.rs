pub mod files;
pub mod submit;
