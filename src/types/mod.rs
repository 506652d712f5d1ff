// ABOUTME: Validated domain types for image references, credentials and build contexts.
// ABOUTME: Parsing happens at construction so invalid input never reaches an external process.

mod context;
mod credentials;
mod image_ref;

pub use context::{BuildContext, CONTAINER_FILES, ContextError};
pub use credentials::{PASSWORD_VAR, RegistryCredentials, USERNAME_VAR};
pub use image_ref::{ImageReference, ParseImageRefError, TAG_FORMAT};
