//! Traits shared by the report pipeline.

use super::validation::ValidationErrors;

/// Trait for validating request objects.
pub trait Validator {
    /// Validate the state of the object.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Furniture repeated on every page.
pub trait PageDecorator {
    /// Typst content expression drawn behind each page. It runs in a
    /// context, so it may read the page counter.
    fn furniture(&self) -> String;
}
