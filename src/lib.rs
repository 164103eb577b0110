//! # fconcat - Directory Tree Concatenator
//!
//! fconcat serializes an entire directory tree into a single text artifact:
//! a decorated structure view followed by the contents of every included
//! file, each prefixed by a path header. It is built for feeding codebases
//! to language models, generating documentation corpora and producing
//! project snapshots.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fconcat::concat::ConcatBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = ConcatBuilder::new("./src")
//!         .output("snapshot.txt")
//!         .exclude("*.lock")
//!         .show_size(true)
//!         .run()?;
//!     println!("Wrote {} files", summary.files);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming Plugins
//!
//! File contents flow through an ordered plugin chain in bounded-memory
//! chunks. Plugins can be in-process components implementing
//! [`plugin::ContentPlugin`] or shared objects loaded at runtime:
//!
//! ```rust,ignore
//! let summary = ConcatBuilder::new(".")
//!     .output("out.txt")
//!     .plugin_path("./plugins/remove_main.so")
//!     .run()?;
//! ```

#![deny(unsafe_code)]

pub mod binary;
pub mod concat;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod inode;
pub mod logging;
pub mod output;
pub mod plugin;
pub mod util;
pub mod walker;

// Re-export commonly used types and functions
pub use binary::FileKind;
pub use concat::{ConcatBuilder, Summary};
pub use config::{BinaryPolicy, Config, SymlinkPolicy};
pub use error::{ConcatError, PatternError, PluginError};
pub use exclusion::PatternSet;
pub use plugin::{ContentPlugin, PluginChain};
pub use walker::{PassMode, PassStats};

// vim: ts=4
