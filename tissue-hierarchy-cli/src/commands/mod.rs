pub mod assign;
pub mod presets;
pub mod validate;
