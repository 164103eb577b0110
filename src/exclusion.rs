//! Pattern-based path exclusion using wildcard patterns
//!
//! Patterns support `*` (zero or more characters, separators included) and
//! `?` (exactly one character). A path is excluded when any pattern matches
//! either its full relative form or its basename. Matching is
//! case-insensitive on case-insensitive hosts and separators are normalized
//! to `/` before comparison.

use crate::error::PatternError;
use crate::logging::warn;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::HashSet;

/// Whether the host filesystem compares paths case-insensitively
const CASE_INSENSITIVE: bool = cfg!(any(windows, target_os = "macos"));

/// Deduplicating set of wildcard exclusion patterns
///
/// Adding the same pattern twice is a no-op and pattern order never affects
/// match outcome.
#[derive(Debug)]
pub struct PatternSet {
	/// Raw pattern strings, for duplicate suppression
	raw: HashSet<String>,

	/// Compiled patterns, kept so the set can be rebuilt on add
	globs: Vec<Glob>,

	/// Compiled matcher over all patterns
	set: GlobSet,
}

impl PatternSet {
	/// Create an empty pattern set
	pub fn new() -> Self {
		PatternSet { raw: HashSet::new(), globs: Vec::new(), set: GlobSet::empty() }
	}

	/// Add a pattern; duplicates are ignored
	pub fn add(&mut self, pattern: &str) -> Result<(), PatternError> {
		if self.raw.contains(pattern) {
			return Ok(());
		}

		let glob = GlobBuilder::new(pattern)
			.case_insensitive(CASE_INSENSITIVE)
			.literal_separator(false)
			.build()
			.map_err(|e| PatternError::InvalidPattern(format!("{}: {}", pattern, e)))?;

		self.raw.insert(pattern.to_string());
		self.globs.push(glob);
		self.rebuild();
		Ok(())
	}

	/// Add a pattern, logging and dropping it on failure instead of erroring
	pub fn add_or_warn(&mut self, pattern: &str) {
		if let Err(e) = self.add(pattern) {
			warn!("Dropping exclusion pattern: {}", e);
		}
	}

	/// Check whether a relative path is excluded.
	///
	/// Tests the normalized full path first, then its basename.
	pub fn matches(&self, relative: &str) -> bool {
		if self.globs.is_empty() {
			return false;
		}

		let normalized = normalize_separators(relative);
		let normalized: &str = &normalized;
		if self.set.is_match(normalized) {
			return true;
		}

		match normalized.rsplit('/').next() {
			Some(basename) if basename != normalized => self.set.is_match(basename),
			_ => false,
		}
	}

	/// Number of distinct patterns in the set
	pub fn len(&self) -> usize {
		self.globs.len()
	}

	/// True when no patterns have been added
	pub fn is_empty(&self) -> bool {
		self.globs.is_empty()
	}

	fn rebuild(&mut self) {
		let mut builder = GlobSetBuilder::new();
		for glob in &self.globs {
			builder.add(glob.clone());
		}
		// All globs were individually validated in add(), so the combined
		// build cannot introduce new pattern errors.
		self.set = builder.build().unwrap_or_else(|_| GlobSet::empty());
	}
}

/// Normalize path separators to the canonical `/` form
pub fn normalize_separators(path: &str) -> std::borrow::Cow<'_, str> {
	if path.contains('\\') {
		std::borrow::Cow::Owned(path.replace('\\', "/"))
	} else {
		std::borrow::Cow::Borrowed(path)
	}
}
