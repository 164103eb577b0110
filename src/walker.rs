//! Recursive directory traversal
//!
//! The walker runs twice per concatenation: a structure pass that renders
//! the decorated tree view and a content pass that streams file bodies
//! through the plugin chain. Both passes visit the same entries in the same
//! order; each starts with a fresh inode tracker so symlink-cycle decisions
//! are identical.
//!
//! Entry-level failures (unreadable metadata, unopenable files, overlong
//! paths) are logged at debug level and skipped; they never abort the run.

use crate::binary::{self, FileKind};
use crate::config::{BinaryPolicy, Config, SymlinkPolicy, MAX_RELATIVE_PATH};
use crate::error::ConcatError;
use crate::inode::InodeTracker;
use crate::logging::debug;
use crate::output::{
	OutputFormatter, MARKER_BROKEN, MARKER_DIR, MARKER_FOLLOWING, MARKER_LOOP, MARKER_SKIPPED,
};
use crate::plugin::PluginChain;
use crate::util::{file_identity, is_filesystem_loop};
use std::fs::{self, File, Metadata};
use std::io::{self, Write};
use std::path::Path;

/// Which of the two output passes is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
	/// Render the decorated tree view
	Structure,
	/// Stream per-file headers and contents
	Content,
}

/// Counters accumulated during one pass
#[derive(Debug, Default, Clone)]
pub struct PassStats {
	/// Regular and symlinked files visited
	pub files: usize,

	/// Directories visited (excluded subtrees are not counted)
	pub dirs: usize,

	/// Symbolic links encountered
	pub symlinks: usize,

	/// Sum of visited file sizes
	pub total_size: u64,

	/// Content bytes written to the sink (content pass only)
	pub bytes_written: u64,
}

/// One traversal pass over the tree
pub struct Walker<'a> {
	config: &'a Config,
	formatter: OutputFormatter,
	chain: &'a mut PluginChain,
	mode: PassMode,
	tracker: InodeTracker,
	stats: PassStats,
}

impl<'a> Walker<'a> {
	pub fn new(config: &'a Config, chain: &'a mut PluginChain, mode: PassMode) -> Self {
		Walker {
			config,
			formatter: OutputFormatter::new(config.show_size),
			chain,
			mode,
			tracker: InodeTracker::new(),
			stats: PassStats::default(),
		}
	}

	/// Run the pass: section header, the walk itself, and (for the
	/// structure pass) the optional total-size footer.
	pub fn run(mut self, sink: &mut dyn Write) -> Result<PassStats, ConcatError> {
		match self.mode {
			PassMode::Structure => self.formatter.structure_header(sink)?,
			PassMode::Content => self.formatter.contents_header(sink)?,
		}

		// The base itself participates in cycle detection so a symlink
		// pointing back at the root is caught on first encounter.
		let base = self.config.base_path.clone();
		if let Ok(meta) = fs::metadata(&base) {
			if let Some((dev, ino)) = file_identity(&meta) {
				self.tracker.add(dev, ino);
			}
		}

		let total = self.walk_dir(sink, &base, "", 0)?;
		self.stats.total_size = total;

		if self.mode == PassMode::Structure && self.config.show_size {
			self.formatter.total_size(sink, total)?;
		}

		Ok(self.stats)
	}

	/// Visit one directory's entries in native read order.
	///
	/// Returns the accumulated size of the visited subtree. Only sink
	/// write errors propagate; everything else is logged and skipped.
	fn walk_dir(
		&mut self,
		sink: &mut dyn Write,
		dir: &Path,
		rel_dir: &str,
		level: usize,
	) -> io::Result<u64> {
		let entries = match fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(e) => {
				debug!("Cannot read directory {}: {}", dir.display(), e);
				return Ok(0);
			}
		};

		let mut total = 0u64;
		for entry in entries {
			let entry = match entry {
				Ok(entry) => entry,
				Err(e) => {
					debug!("Cannot read entry in {}: {}", dir.display(), e);
					continue;
				}
			};

			let name = entry.file_name().to_string_lossy().into_owned();
			let rel = if rel_dir.is_empty() {
				name.clone()
			} else {
				format!("{}/{}", rel_dir, name)
			};

			if rel.len() > MAX_RELATIVE_PATH {
				debug!("Path too long, skipping: {}", rel);
				continue;
			}

			// Exclusion short-circuits recursion: a matching directory's
			// descendants are never visited.
			if self.config.excludes.matches(&rel) {
				debug!("Excluded: {}", rel);
				continue;
			}

			let abs = entry.path();
			let meta = match fs::symlink_metadata(&abs) {
				Ok(meta) => meta,
				Err(e) => {
					debug!("Cannot stat {}: {}", rel, e);
					continue;
				}
			};

			let file_type = meta.file_type();
			if file_type.is_symlink() {
				self.stats.symlinks += 1;
				total += self.visit_symlink(sink, &abs, &rel, &name, level)?;
			} else if file_type.is_dir() {
				self.stats.dirs += 1;
				if self.mode == PassMode::Structure {
					self.formatter.dir_line(sink, level, &name)?;
				}
				total += self.walk_dir(sink, &abs, &rel, level + 1)?;
			} else if file_type.is_file() {
				total += self.visit_file(sink, &abs, &rel, meta.len(), level, &name, false)?;
			} else {
				// Sockets, fifos, devices: not part of the artifact
				debug!("Ignoring special entry: {}", rel);
			}
		}

		Ok(total)
	}

	/// Visit a regular file (or a resolved symlink target under
	/// Follow/Include, flagged by `via_symlink`).
	fn visit_file(
		&mut self,
		sink: &mut dyn Write,
		abs: &Path,
		rel: &str,
		size: u64,
		level: usize,
		name: &str,
		via_symlink: bool,
	) -> io::Result<u64> {
		self.stats.files += 1;

		if self.mode == PassMode::Structure {
			self.formatter.file_line(sink, level, name, size)?;
			return Ok(size);
		}

		match self.config.binary_policy {
			BinaryPolicy::Include => {
				self.stream_file(sink, abs, rel, via_symlink)?;
			}
			BinaryPolicy::Skip | BinaryPolicy::Placeholder => {
				match binary::probe_file(abs) {
					Err(e) => {
						debug!("Cannot classify {}: {}", rel, e);
					}
					Ok(FileKind::Binary) => {
						if self.config.binary_policy == BinaryPolicy::Placeholder {
							self.formatter.file_header(sink, rel, via_symlink)?;
							self.formatter.binary_placeholder(sink)?;
							self.formatter.file_trailer(sink)?;
						}
					}
					Ok(FileKind::Text) => {
						self.stream_file(sink, abs, rel, via_symlink)?;
					}
				}
			}
		}

		Ok(size)
	}

	/// Stream one file body through the plugin chain, bracketed by the
	/// per-file header and trailer. An unopenable file emits nothing.
	fn stream_file(
		&mut self,
		sink: &mut dyn Write,
		abs: &Path,
		rel: &str,
		via_symlink: bool,
	) -> io::Result<()> {
		let mut file = match File::open(abs) {
			Ok(file) => file,
			Err(e) => {
				debug!("Cannot open {}: {}", rel, e);
				return Ok(());
			}
		};

		self.formatter.file_header(sink, rel, via_symlink)?;
		self.stats.bytes_written += self.chain.pipe_file(rel, &mut file, sink)?;
		self.formatter.file_trailer(sink)
	}

	/// Apply the symlink policy matrix to one link entry.
	fn visit_symlink(
		&mut self,
		sink: &mut dyn Write,
		abs: &Path,
		rel: &str,
		name: &str,
		level: usize,
	) -> io::Result<u64> {
		if self.config.symlink_policy == SymlinkPolicy::Skip {
			if self.mode == PassMode::Structure {
				self.formatter.symlink_marker_line(sink, level, name, MARKER_SKIPPED)?;
			}
			return Ok(0);
		}

		// Resolve the target through the link
		let target_meta = match fs::metadata(abs) {
			Ok(meta) => meta,
			Err(e) => {
				let marker = if is_filesystem_loop(&e) { MARKER_LOOP } else { MARKER_BROKEN };
				if self.mode == PassMode::Structure {
					self.formatter.symlink_marker_line(sink, level, name, marker)?;
				}
				debug!("Symlink {} does not resolve: {}", rel, e);
				return Ok(0);
			}
		};

		if target_meta.is_dir() {
			self.visit_symlink_dir(sink, abs, rel, name, level, &target_meta)
		} else {
			self.visit_symlink_file(sink, abs, rel, name, level, &target_meta)
		}
	}

	fn visit_symlink_dir(
		&mut self,
		sink: &mut dyn Write,
		abs: &Path,
		rel: &str,
		name: &str,
		level: usize,
		target_meta: &Metadata,
	) -> io::Result<u64> {
		match self.config.symlink_policy {
			SymlinkPolicy::Placeholder => {
				if self.mode == PassMode::Structure {
					self.formatter.symlink_marker_line(sink, level, name, MARKER_DIR)?;
				}
				Ok(0)
			}
			SymlinkPolicy::Follow | SymlinkPolicy::Include => {
				if !self.track_target(target_meta) {
					if self.mode == PassMode::Structure {
						self.formatter.symlink_marker_line(sink, level, name, MARKER_LOOP)?;
					}
					debug!("Symlink cycle at {}", rel);
					return Ok(0);
				}

				if self.config.symlink_policy == SymlinkPolicy::Include {
					// Include resolves files only; a fresh symlinked
					// directory is treated as absent
					return Ok(0);
				}

				if self.mode == PassMode::Structure {
					self.formatter.symlink_marker_line(sink, level, name, MARKER_FOLLOWING)?;
				}
				self.walk_dir(sink, abs, rel, level + 1)
			}
			SymlinkPolicy::Skip => Ok(0),
		}
	}

	fn visit_symlink_file(
		&mut self,
		sink: &mut dyn Write,
		abs: &Path,
		rel: &str,
		name: &str,
		level: usize,
		target_meta: &Metadata,
	) -> io::Result<u64> {
		let size = target_meta.len();
		match self.config.symlink_policy {
			SymlinkPolicy::Placeholder => {
				if self.mode == PassMode::Structure {
					let target = fs::read_link(abs)
						.map(|t| t.to_string_lossy().into_owned())
						.unwrap_or_else(|_| "?".to_string());
					self.formatter.symlink_file_line(sink, level, name, &target, size)?;
				} else {
					self.formatter.file_header(sink, rel, false)?;
					self.formatter.symlink_placeholder(sink)?;
					self.formatter.file_trailer(sink)?;
				}
				Ok(size)
			}
			SymlinkPolicy::Follow | SymlinkPolicy::Include => {
				if !self.track_target(target_meta) {
					if self.mode == PassMode::Structure {
						self.formatter.symlink_marker_line(sink, level, name, MARKER_LOOP)?;
					}
					debug!("Symlink cycle at {}", rel);
					return Ok(0);
				}
				self.visit_file(sink, abs, rel, size, level, name, true)
			}
			SymlinkPolicy::Skip => Ok(0),
		}
	}

	/// Insert a resolved target into the tracker. Returns false when the
	/// target was already visited this pass. Hosts without stable file
	/// identities treat every target as fresh.
	fn track_target(&mut self, target_meta: &Metadata) -> bool {
		match file_identity(target_meta) {
			Some((dev, ino)) => self.tracker.add(dev, ino),
			None => true,
		}
	}
}
