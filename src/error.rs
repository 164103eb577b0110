//! Error types for fconcat operations

use std::error::Error;
use std::fmt;
use std::io;

/// Main error type for concatenation runs
///
/// Only pre-walk failures surface through this type: invalid configuration,
/// an unopenable output sink and plugin load failures are fatal, while
/// per-entry problems during the walk are logged and skipped.
#[derive(Debug)]
pub enum ConcatError {
	/// Invalid configuration (bad base path, bad mode string, ...)
	InvalidConfig { message: String },

	/// The base directory cannot be read
	BaseUnreadable { path: String, source: io::Error },

	/// The output sink cannot be created or written
	OutputUnopenable { path: String, source: io::Error },

	/// A plugin failed to load or initialize
	Plugin(PluginError),

	/// I/O error on the output sink
	Io(io::Error),
}

impl fmt::Display for ConcatError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConcatError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			ConcatError::BaseUnreadable { path, source } => {
				write!(f, "Cannot read base directory {}: {}", path, source)
			}
			ConcatError::OutputUnopenable { path, source } => {
				write!(f, "Cannot open output {}: {}", path, source)
			}
			ConcatError::Plugin(e) => write!(f, "Plugin error: {}", e),
			ConcatError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for ConcatError {}

impl From<io::Error> for ConcatError {
	fn from(e: io::Error) -> Self {
		ConcatError::Io(e)
	}
}

impl From<PluginError> for ConcatError {
	fn from(e: PluginError) -> Self {
		ConcatError::Plugin(e)
	}
}

/// Plugin-specific errors
///
/// Load and init failures abort the run before the content pass; chunk
/// failures stay local to one chunk of one file and never surface here.
#[derive(Debug)]
pub enum PluginError {
	/// Shared object could not be loaded
	LoadFailed { path: String, message: String },

	/// The entry symbol is missing or returned a null descriptor
	MissingSymbol { path: String, symbol: String },

	/// `init` returned a non-zero status
	InitFailed { name: String, status: i32 },

	/// `process_chunk` returned a non-zero status
	ChunkFailed { name: String, status: i32 },
}

impl fmt::Display for PluginError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PluginError::LoadFailed { path, message } => {
				write!(f, "Failed to load plugin {}: {}", path, message)
			}
			PluginError::MissingSymbol { path, symbol } => {
				write!(f, "Plugin {} does not export symbol '{}'", path, symbol)
			}
			PluginError::InitFailed { name, status } => {
				write!(f, "Plugin {} init returned status {}", name, status)
			}
			PluginError::ChunkFailed { name, status } => {
				write!(f, "Plugin {} failed on chunk with status {}", name, status)
			}
		}
	}
}

impl Error for PluginError {}

/// Pattern-set errors
#[derive(Debug)]
pub enum PatternError {
	/// Failed to compile a wildcard pattern
	InvalidPattern(String),
}

impl fmt::Display for PatternError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PatternError::InvalidPattern(msg) => {
				write!(f, "Invalid exclusion pattern: {}", msg)
			}
		}
	}
}

impl Error for PatternError {}


// vim: ts=4
