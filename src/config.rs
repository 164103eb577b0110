//! Unified run configuration for fconcat
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (`Config::new`)
//! 2. Config file (`~/.config/fconcat/config.toml`, or `$FCONCAT_CONFIG`)
//! 3. Environment variables (`FCONCAT_VERBOSE`)
//! 4. CLI flags (highest priority)
//!
//! The resulting `Config` is immutable for the duration of a run.

use crate::exclusion::PatternSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Chunk size for the content-pass plugin pipeline, in bytes
pub const CHUNK_SIZE: usize = 4096;

/// Number of bytes sampled from a file head for binary classification
pub const BINARY_SAMPLE_SIZE: usize = 8192;

/// Maximum length of a relative path, in bytes; longer joins are skipped
pub const MAX_RELATIVE_PATH: usize = 4096;

// ============================================================================
// POLICY ENUMS
// ============================================================================

/// How binary files are handled during the content pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryPolicy {
	/// Omit binary file contents entirely (default)
	#[default]
	Skip,

	/// Stream binary contents verbatim, no classification
	Include,

	/// Emit a one-line placeholder comment instead of the contents
	Placeholder,
}

impl FromStr for BinaryPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"skip" => Ok(Self::Skip),
			"include" => Ok(Self::Include),
			"placeholder" => Ok(Self::Placeholder),
			_ => Err(format!(
				"Unknown binary mode: {}. Valid options: skip, include, placeholder",
				s
			)),
		}
	}
}

impl std::fmt::Display for BinaryPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Skip => write!(f, "skip"),
			Self::Include => write!(f, "include"),
			Self::Placeholder => write!(f, "placeholder"),
		}
	}
}

/// How symbolic links are handled during both passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SymlinkPolicy {
	/// Mark symlinks in the structure view, never resolve them (default)
	#[default]
	Skip,

	/// Resolve symlinks; recurse into fresh directories, read through files
	Follow,

	/// Resolve symlink-to-file only; symlinked directories are absent
	Include,

	/// Show resolved targets as placeholders without reading through
	Placeholder,
}

impl FromStr for SymlinkPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"skip" => Ok(Self::Skip),
			"follow" => Ok(Self::Follow),
			"include" => Ok(Self::Include),
			"placeholder" => Ok(Self::Placeholder),
			_ => Err(format!(
				"Unknown symlink mode: {}. Valid options: skip, follow, include, placeholder",
				s
			)),
		}
	}
}

impl std::fmt::Display for SymlinkPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Skip => write!(f, "skip"),
			Self::Follow => write!(f, "follow"),
			Self::Include => write!(f, "include"),
			Self::Placeholder => write!(f, "placeholder"),
		}
	}
}

// ============================================================================
// CONFIG FILE LAYER
// ============================================================================

/// Settings read from the optional TOML config file
///
/// Every field is optional; anything missing falls back to the built-in
/// default, and every field can still be overridden by CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileConfig {
	/// Wildcard patterns always excluded from the walk
	pub exclude: Vec<String>,

	/// Show formatted sizes on tree entries and a total footer
	pub show_size: Option<bool>,

	/// Binary-file handling mode
	pub binary: Option<BinaryPolicy>,

	/// Symlink handling mode
	pub symlinks: Option<SymlinkPolicy>,
}

impl FileConfig {
	/// Load settings from an explicit TOML file
	pub fn load(path: &Path) -> Result<Self, String> {
		let text = std::fs::read_to_string(path)
			.map_err(|e| format!("cannot read config file {}: {}", path.display(), e))?;
		toml::from_str(&text)
			.map_err(|e| format!("cannot parse config file {}: {}", path.display(), e))
	}

	/// Discover and load the config file, if any.
	///
	/// Order: explicit `--config` path (errors are fatal), then
	/// `$FCONCAT_CONFIG`, then `~/.config/fconcat/config.toml`. A missing
	/// default file is not an error.
	pub fn discover(explicit: Option<&Path>) -> Result<Self, String> {
		if let Some(path) = explicit {
			return Self::load(path);
		}

		if let Ok(env_path) = std::env::var("FCONCAT_CONFIG") {
			return Self::load(Path::new(&env_path));
		}

		if let Some(default_path) = Self::default_path() {
			if default_path.is_file() {
				return Self::load(&default_path);
			}
		}

		Ok(Self::default())
	}

	fn default_path() -> Option<PathBuf> {
		let config_home = match std::env::var("XDG_CONFIG_HOME") {
			Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
			_ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
		};
		Some(config_home.join("fconcat").join("config.toml"))
	}
}

// ============================================================================
// RUN CONFIGURATION
// ============================================================================

/// Immutable configuration for a single concatenation run
#[derive(Debug)]
pub struct Config {
	/// Root directory whose tree is serialized
	pub base_path: PathBuf,

	/// Pattern set consulted for every relative path during both passes
	pub excludes: PatternSet,

	/// Binary-file handling mode
	pub binary_policy: BinaryPolicy,

	/// Symlink handling mode
	pub symlink_policy: SymlinkPolicy,

	/// Show formatted sizes on tree entries and a total footer
	pub show_size: bool,

	/// Shared-object plugins loaded before the content pass, in order
	pub plugin_paths: Vec<PathBuf>,

	/// Stay alive after the run until SIGINT/SIGTERM arrives
	pub interactive: bool,

	/// Emit per-entry skip/exclude/error annotations; read once from
	/// `FCONCAT_VERBOSE` at startup, never mutated afterwards
	pub verbose: bool,
}

impl Config {
	/// Create a configuration with built-in defaults for the given base
	pub fn new(base_path: impl Into<PathBuf>) -> Self {
		Config {
			base_path: base_path.into(),
			excludes: PatternSet::new(),
			binary_policy: BinaryPolicy::default(),
			symlink_policy: SymlinkPolicy::default(),
			show_size: false,
			plugin_paths: Vec::new(),
			interactive: false,
			verbose: false,
		}
	}

	/// Apply the config-file layer (lower priority than CLI flags)
	pub fn apply_file(&mut self, file: &FileConfig) {
		for pattern in &file.exclude {
			self.excludes.add_or_warn(pattern);
		}
		if let Some(show_size) = file.show_size {
			self.show_size = show_size;
		}
		if let Some(binary) = file.binary {
			self.binary_policy = binary;
		}
		if let Some(symlinks) = file.symlinks {
			self.symlink_policy = symlinks;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_binary_policy_from_str() {
		assert_eq!(BinaryPolicy::from_str("skip").unwrap(), BinaryPolicy::Skip);
		assert_eq!(BinaryPolicy::from_str("INCLUDE").unwrap(), BinaryPolicy::Include);
		assert_eq!(BinaryPolicy::from_str("placeholder").unwrap(), BinaryPolicy::Placeholder);
		assert!(BinaryPolicy::from_str("zip").is_err());
	}

	#[test]
	fn test_symlink_policy_from_str() {
		assert_eq!(SymlinkPolicy::from_str("skip").unwrap(), SymlinkPolicy::Skip);
		assert_eq!(SymlinkPolicy::from_str("follow").unwrap(), SymlinkPolicy::Follow);
		assert_eq!(SymlinkPolicy::from_str("include").unwrap(), SymlinkPolicy::Include);
		assert_eq!(SymlinkPolicy::from_str("Placeholder").unwrap(), SymlinkPolicy::Placeholder);
		assert!(SymlinkPolicy::from_str("mirror").is_err());
	}

	#[test]
	fn test_policy_display_round_trip() {
		for policy in [SymlinkPolicy::Skip, SymlinkPolicy::Follow, SymlinkPolicy::Include] {
			let text = policy.to_string();
			assert_eq!(SymlinkPolicy::from_str(&text).unwrap(), policy);
		}
	}

	#[test]
	fn test_defaults() {
		let config = Config::new(".");
		assert_eq!(config.binary_policy, BinaryPolicy::Skip);
		assert_eq!(config.symlink_policy, SymlinkPolicy::Skip);
		assert!(!config.show_size);
		assert!(!config.interactive);
		assert!(!config.verbose);
	}

	#[test]
	fn test_file_config_parse() {
		let file: FileConfig = toml::from_str(
			r#"
			exclude = ["*.log", "target"]
			show-size = true
			binary = "placeholder"
			symlinks = "follow"
			"#,
		)
		.unwrap();
		assert_eq!(file.exclude.len(), 2);
		assert_eq!(file.show_size, Some(true));
		assert_eq!(file.binary, Some(BinaryPolicy::Placeholder));
		assert_eq!(file.symlinks, Some(SymlinkPolicy::Follow));
	}

	#[test]
	fn test_apply_file_layering() {
		let mut config = Config::new(".");
		let file: FileConfig =
			toml::from_str(r#"exclude = ["*.tmp"]"#).unwrap();
		config.apply_file(&file);
		assert!(config.excludes.matches("junk.tmp"));
		// Untouched fields keep their defaults
		assert_eq!(config.binary_policy, BinaryPolicy::Skip);
	}
}

// vim: ts=4
