pub mod enums;
pub mod fields;
pub mod document;
pub mod dossier;

pub use enums::*;
pub use fields::*;
pub use document::*;
pub use dossier::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
