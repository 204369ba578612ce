//! Parsing of the documents found inside a gateway configuration bundle.
//!
//! Everything here works on bytes that have already been read from a bundle;
//! where those bytes came from (an archive entry or a plain file) is the
//! concern of `ember-source`.

mod consts;
pub mod error;
mod manifest;
mod project;
mod properties;
mod xml;

pub use crate::consts::{INIT_MEMORY_KEY, MAX_MEMORY_KEY, NODE_ROLE_KEY, PERSPECTIVE_MODULE, VISION_MODULE};
pub use crate::manifest::Manifest;
pub use crate::project::{ProjectDefinition, ProjectKind};
pub use crate::properties::Properties;
