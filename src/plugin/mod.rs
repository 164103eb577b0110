//! Content-transform plugin chain
//!
//! Plugins transform file contents in bounded-memory chunks during the
//! content pass. A plugin brackets every file with `file_start` /
//! `file_cleanup` and may keep carry-over state between chunks, which lets
//! stateful detectors match tokens that straddle chunk boundaries.
//!
//! Two kinds of plugins share the [`ContentPlugin`] trait: in-process
//! components pushed directly onto the chain, and shared objects loaded at
//! runtime through the C ABI adapter in [`native`].

mod native;

pub use native::NativePlugin;

use crate::config::CHUNK_SIZE;
use crate::error::PluginError;
use crate::logging::{debug, info};
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Six-operation capability set every content transformer implements
///
/// Per-file state lives inside the plugin between `file_start` and
/// `file_cleanup`; the host drives exactly one file at a time, so the
/// bracketing is unambiguous.
pub trait ContentPlugin {
	/// Plugin name, for diagnostics
	fn name(&self) -> &str;

	/// Plugin version string
	fn version(&self) -> &str;

	/// One-time global setup; an error aborts the run during loading
	fn init(&mut self) -> Result<(), PluginError> {
		Ok(())
	}

	/// One-time global teardown
	fn cleanup(&mut self) {}

	/// Begin a file. Returning false skips this plugin for this file
	/// (the plugin stays loaded for subsequent files).
	fn file_start(&mut self, relative_path: &str) -> bool;

	/// Transform one chunk (at most [`CHUNK_SIZE`] bytes).
	///
	/// An empty output means "unchanged": the host passes the plugin's
	/// input through to the next stage. An error discards this plugin's
	/// contribution for this chunk only.
	fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, PluginError>;

	/// Final flush opportunity after the last chunk; returned bytes are
	/// appended to the file body
	fn file_end(&mut self) -> Result<Vec<u8>, PluginError>;

	/// Per-file teardown
	fn file_cleanup(&mut self);
}

/// Ordered plugin chain driven once per text file
///
/// The chain preserves user-specified order. With zero plugins the
/// pipeline degenerates to a direct chunked copy.
#[derive(Default)]
pub struct PluginChain {
	plugins: Vec<Box<dyn ContentPlugin>>,
}

impl PluginChain {
	/// Create an empty chain
	pub fn new() -> Self {
		PluginChain { plugins: Vec::new() }
	}

	/// Append an in-process plugin
	pub fn push(&mut self, plugin: Box<dyn ContentPlugin>) {
		self.plugins.push(plugin);
	}

	/// Load shared-object plugins in the given order and append them
	pub fn load_native(&mut self, paths: &[PathBuf]) -> Result<(), PluginError> {
		for path in paths {
			let position = self.plugins.len();
			let plugin = NativePlugin::load(path, position)?;
			info!("Loaded plugin {} {} from {}", plugin.name(), plugin.version(), path.display());
			self.plugins.push(Box::new(plugin));
		}
		Ok(())
	}

	/// Run `init` on every plugin in load order; the first failure aborts
	pub fn init_all(&mut self) -> Result<(), PluginError> {
		for plugin in &mut self.plugins {
			plugin.init()?;
		}
		Ok(())
	}

	/// Run `cleanup` on every plugin in reverse load order
	pub fn shutdown(&mut self) {
		for plugin in self.plugins.iter_mut().rev() {
			plugin.cleanup();
		}
	}

	/// True when no plugins are loaded
	pub fn is_empty(&self) -> bool {
		self.plugins.is_empty()
	}

	/// Number of loaded plugins
	pub fn len(&self) -> usize {
		self.plugins.len()
	}

	/// Stream one file through the chain.
	///
	/// Reads `reader` in chunks of at most [`CHUNK_SIZE`] bytes, pipes
	/// every chunk through the participating plugins left to right and
	/// writes the final buffer to `writer`. After EOF each participating
	/// plugin gets a `file_end` flush whose bytes are appended, then its
	/// `file_cleanup`. Returns the number of bytes written.
	pub fn pipe_file(
		&mut self,
		relative_path: &str,
		reader: &mut dyn Read,
		writer: &mut dyn Write,
	) -> io::Result<u64> {
		let mut active = Vec::with_capacity(self.plugins.len());
		for (index, plugin) in self.plugins.iter_mut().enumerate() {
			if plugin.file_start(relative_path) {
				active.push(index);
			} else {
				debug!("Plugin {} skipped file {}", plugin.name(), relative_path);
			}
		}

		let mut written = 0u64;
		let mut buf = [0u8; CHUNK_SIZE];
		loop {
			let n = reader.read(&mut buf)?;
			if n == 0 {
				break;
			}

			if active.is_empty() {
				writer.write_all(&buf[..n])?;
				written += n as u64;
				continue;
			}

			let mut current = buf[..n].to_vec();
			for &index in &active {
				let plugin = &mut self.plugins[index];
				match plugin.process_chunk(&current) {
					// Empty output: the unchanged buffer feeds the next plugin
					Ok(output) if output.is_empty() => {}
					Ok(output) => current = output,
					Err(e) => {
						// Failure is local: this plugin's contribution to
						// this chunk is discarded, the pipeline continues
						debug!("Discarding chunk transform for {}: {}", relative_path, e);
					}
				}
			}
			writer.write_all(&current)?;
			written += current.len() as u64;
		}

		for &index in &active {
			let plugin = &mut self.plugins[index];
			match plugin.file_end() {
				Ok(tail) if !tail.is_empty() => {
					writer.write_all(&tail)?;
					written += tail.len() as u64;
				}
				Ok(_) => {}
				Err(e) => {
					debug!("Discarding tail flush for {}: {}", relative_path, e);
				}
			}
		}

		for &index in &active {
			self.plugins[index].file_cleanup();
		}

		Ok(written)
	}
}
