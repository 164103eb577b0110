//! Run orchestration
//!
//! Sequences a concatenation: validate the base, auto-exclude the output
//! file when it lives inside the tree, write the structure pass, write the
//! content pass, then run plugin shutdown (immediately, or after the
//! interactive wait). Output is written from scratch on every run.

use crate::config::Config;
use crate::error::ConcatError;
use crate::exclusion::normalize_separators;
use crate::logging::{debug, info};
use crate::plugin::{ContentPlugin, PluginChain};
use crate::util::wait_for_termination;
use crate::walker::{PassMode, Walker};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Counters reported after a completed run
#[derive(Debug, Clone)]
pub struct Summary {
	/// Files visited (regular plus resolved symlinked files)
	pub files: usize,

	/// Directories visited
	pub dirs: usize,

	/// Symbolic links encountered
	pub symlinks: usize,

	/// Sum of visited file sizes
	pub total_size: u64,

	/// Content bytes written to the sink
	pub bytes_written: u64,

	/// Wall-clock duration of both passes
	pub elapsed: Duration,
}

/// Run both passes against an already-open sink.
///
/// The plugin chain must be loaded but not yet initialized; this function
/// owns its full lifecycle from `init` to `cleanup`.
pub fn run_with_chain(
	config: &Config,
	mut chain: PluginChain,
	sink: &mut dyn Write,
) -> Result<Summary, ConcatError> {
	let start = Instant::now();

	let base_meta = fs::metadata(&config.base_path).map_err(|e| ConcatError::BaseUnreadable {
		path: config.base_path.display().to_string(),
		source: e,
	})?;
	if !base_meta.is_dir() {
		return Err(ConcatError::InvalidConfig {
			message: format!("{} is not a directory", config.base_path.display()),
		});
	}

	chain.init_all()?;

	let structure = Walker::new(config, &mut chain, PassMode::Structure).run(sink)?;
	let content = Walker::new(config, &mut chain, PassMode::Content).run(sink)?;
	sink.flush().map_err(ConcatError::Io)?;

	if config.interactive {
		info!("Run complete; waiting for termination signal");
		wait_for_termination();
	}
	chain.shutdown();

	Ok(Summary {
		files: structure.files,
		dirs: structure.dirs,
		symlinks: structure.symlinks,
		total_size: structure.total_size,
		bytes_written: content.bytes_written,
		elapsed: start.elapsed(),
	})
}

/// Run both passes with the plugins named in the configuration.
pub fn run(config: &Config, sink: &mut dyn Write) -> Result<Summary, ConcatError> {
	let mut chain = PluginChain::new();
	chain.load_native(&config.plugin_paths)?;
	run_with_chain(config, chain, sink)
}

/// Prevent the artifact from being read back into itself.
///
/// When the output path lies inside the base tree, its absolute form, its
/// relative form and its basename are pushed as exclusion patterns; the raw
/// argument string is added too when the base is `.`.
pub fn auto_exclude_output(config: &mut Config, output: &Path) {
	let Ok(abs_base) = fs::canonicalize(&config.base_path) else {
		return;
	};

	// The output file may not exist yet; canonicalize its parent instead
	let parent = match output.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let Some(file_name) = output.file_name() else {
		return;
	};
	let Ok(abs_parent) = fs::canonicalize(parent) else {
		return;
	};
	let abs_output = abs_parent.join(file_name);

	if !abs_output.starts_with(&abs_base) {
		return;
	}

	let abs_str = abs_output.to_string_lossy();
	config.excludes.add_or_warn(&normalize_separators(&abs_str));

	if let Ok(rel) = abs_output.strip_prefix(&abs_base) {
		let rel_str = rel.to_string_lossy();
		config.excludes.add_or_warn(&normalize_separators(&rel_str));
	}

	config.excludes.add_or_warn(&file_name.to_string_lossy());

	if config.base_path == Path::new(".") {
		config.excludes.add_or_warn(&output.to_string_lossy());
	}

	debug!("Auto-excluding output file {}", abs_output.display());
}

enum PluginEntry {
	Path(PathBuf),
	Instance(Box<dyn ContentPlugin>),
}

/// Builder-style entry point for embedding the engine
///
/// ```rust,ignore
/// use fconcat::concat::ConcatBuilder;
///
/// let summary = ConcatBuilder::new("./project")
///     .output("project.txt")
///     .exclude("*.log")
///     .show_size(true)
///     .run()?;
/// println!("Wrote {} files", summary.files);
/// ```
pub struct ConcatBuilder {
	config: Config,
	output: Option<PathBuf>,
	plugins: Vec<PluginEntry>,
}

impl ConcatBuilder {
	/// Start a builder for the given base directory
	pub fn new(base_path: impl Into<PathBuf>) -> Self {
		ConcatBuilder { config: Config::new(base_path), output: None, plugins: Vec::new() }
	}

	/// Set the output file path
	pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
		self.output = Some(path.into());
		self
	}

	/// Add one exclusion pattern; invalid patterns are logged and dropped
	pub fn exclude(mut self, pattern: &str) -> Self {
		self.config.excludes.add_or_warn(pattern);
		self
	}

	/// Set the binary-file handling mode
	pub fn binary_policy(mut self, policy: crate::config::BinaryPolicy) -> Self {
		self.config.binary_policy = policy;
		self
	}

	/// Set the symlink handling mode
	pub fn symlink_policy(mut self, policy: crate::config::SymlinkPolicy) -> Self {
		self.config.symlink_policy = policy;
		self
	}

	/// Decorate tree entries with sizes and emit the total footer
	pub fn show_size(mut self, show_size: bool) -> Self {
		self.config.show_size = show_size;
		self
	}

	/// Stay alive after the run until SIGINT/SIGTERM arrives
	pub fn interactive(mut self, interactive: bool) -> Self {
		self.config.interactive = interactive;
		self
	}

	/// Emit per-entry skip/exclude/error annotations
	pub fn verbose(mut self, verbose: bool) -> Self {
		self.config.verbose = verbose;
		self
	}

	/// The run configuration assembled so far
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Append a shared-object plugin (loaded at run time, order preserved)
	pub fn plugin_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.plugins.push(PluginEntry::Path(path.into()));
		self
	}

	/// Append an in-process plugin (order preserved)
	pub fn plugin(mut self, plugin: Box<dyn ContentPlugin>) -> Self {
		self.plugins.push(PluginEntry::Instance(plugin));
		self
	}

	fn build_chain(entries: Vec<PluginEntry>) -> Result<PluginChain, ConcatError> {
		let mut chain = PluginChain::new();
		for entry in entries {
			match entry {
				PluginEntry::Path(path) => chain.load_native(std::slice::from_ref(&path))?,
				PluginEntry::Instance(plugin) => chain.push(plugin),
			}
		}
		Ok(chain)
	}

	/// Run against an arbitrary sink. No output file is involved, so no
	/// auto-exclusion happens.
	pub fn write_to(self, sink: &mut dyn Write) -> Result<Summary, ConcatError> {
		let chain = Self::build_chain(self.plugins)?;
		run_with_chain(&self.config, chain, sink)
	}

	/// Run against the configured output file.
	pub fn run(mut self) -> Result<Summary, ConcatError> {
		let output = self.output.take().ok_or_else(|| ConcatError::InvalidConfig {
			message: "no output file configured".to_string(),
		})?;

		auto_exclude_output(&mut self.config, &output);

		let file = File::create(&output).map_err(|e| ConcatError::OutputUnopenable {
			path: output.display().to_string(),
			source: e,
		})?;
		let mut sink = BufWriter::new(file);

		let chain = Self::build_chain(self.plugins)?;
		run_with_chain(&self.config, chain, &mut sink)
	}
}


// vim: ts=4
