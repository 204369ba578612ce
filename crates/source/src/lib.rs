//! Uniform access to gateway configuration bundles.
//!
//! A bundle is stored either as a gateway backup (`.gwbk`, a ZIP archive) or
//! as an unpacked configuration directory. This crate opens either kind as a
//! [`ConfigSource`] and wraps it in a [`Bundle`], so that statistics code can
//! read the manifest, properties files, projects and the embedded
//! configuration database without knowing which one it's looking at.
//!
//! # Resources
//! A source holds on to things that outlive a single call: the mounted
//! archive, a private temp copy of the configuration database, and the
//! connection pool over that copy. [`Bundle::close`] releases all of them.
//!
//! ```no_run
//! use ember_source::{Bundle, SourceOptions};
//!
//! # async fn example() -> ember_source::error::Result<()> {
//! let bundle = Bundle::open("/backups/plant-gw.gwbk", &SourceOptions::default()).await?;
//! if let Some(manifest) = bundle.manifest().await? {
//!     println!("{} ({:?})", bundle.display_name(), manifest.version());
//! }
//! bundle.close().await?;
//! # Ok(())
//! # }
//! ```

mod bundle;
pub mod consts;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod materialize;
mod memo;
mod path;
mod source;
pub mod tree;

pub use crate::bundle::{Bundle, looks_like_bundle};
pub use crate::path::validate as validate_path;
pub use crate::source::{
    ArchiveSource, ConfigSource, DirectorySource, SourceHandle, SourceKind, SourceOptions, Subtree, open_source,
};
pub use ember_extract::{Manifest, Properties};
pub use ember_idb::Database;
