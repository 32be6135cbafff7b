//! Validated forms assembled from multi-step dialogs

pub mod forms;

pub use forms::RegistrationForm;
