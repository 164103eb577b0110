//! Shared-object plugin adapter
//!
//! Loads a dynamic library, resolves the single `fconcat_plugin` entry
//! symbol and copies the returned descriptor into host-owned storage. The
//! descriptor carries two metadata strings and six optional operation
//! slots; any slot may be null. Buffers returned by the plugin are
//! allocated with the C allocator and released by the host after use.

use super::ContentPlugin;
use crate::error::PluginError;
use libloading::{Library, Symbol};
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::Path;

/// Entry symbol every plugin shared object must export
const ENTRY_SYMBOL: &[u8] = b"fconcat_plugin";

type EntryFn = unsafe extern "C" fn() -> *const RawDescriptor;
type InitFn = unsafe extern "C" fn() -> c_int;
type CleanupFn = unsafe extern "C" fn();
type FileStartFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type ProcessChunkFn =
	unsafe extern "C" fn(*mut c_void, *const u8, usize, *mut *mut u8, *mut usize) -> c_int;
type FileEndFn = unsafe extern "C" fn(*mut c_void, *mut *mut u8, *mut usize) -> c_int;
type FileCleanupFn = unsafe extern "C" fn(*mut c_void);

/// Plugin descriptor as laid out in the shared object
#[repr(C)]
#[derive(Clone, Copy)]
#[derive(Debug)]
pub struct RawDescriptor {
	pub name: *const c_char,
	pub version: *const c_char,
	pub init: Option<InitFn>,
	pub cleanup: Option<CleanupFn>,
	pub file_start: Option<FileStartFn>,
	pub process_chunk: Option<ProcessChunkFn>,
	pub file_end: Option<FileEndFn>,
	pub file_cleanup: Option<FileCleanupFn>,
}

/// A loaded shared-object plugin
///
/// Holds the library handle for the lifetime of the chain so the
/// descriptor's function pointers stay valid. The per-file context pointer
/// is owned by the plugin and only stored here between `file_start` and
/// `file_cleanup`.
#[derive(Debug)]
pub struct NativePlugin {
	// Field order matters: the descriptor borrows from the library, so the
	// library must be dropped last.
	descriptor: RawDescriptor,
	_library: Library,
	name: String,
	version: String,
	position: usize,
	ctx: *mut c_void,
}

impl NativePlugin {
	/// Load a plugin shared object and resolve its descriptor
	#[allow(unsafe_code)] // Dynamic loading requires the raw libloading API
	pub fn load(path: &Path, position: usize) -> Result<Self, PluginError> {
		let display = path.display().to_string();

		// SAFETY: loading a shared object runs its constructors; that is
		// the documented contract of a plugin and cannot be checked here.
		let library = unsafe { Library::new(path) }.map_err(|e| PluginError::LoadFailed {
			path: display.clone(),
			message: e.to_string(),
		})?;

		// SAFETY: the symbol is typed as the documented entry signature;
		// a plugin exporting it with another type is undefined behavior by
		// its own contract.
		let entry: Symbol<'_, EntryFn> = unsafe { library.get(ENTRY_SYMBOL) }.map_err(|_| {
			PluginError::MissingSymbol {
				path: display.clone(),
				symbol: String::from_utf8_lossy(ENTRY_SYMBOL).to_string(),
			}
		})?;

		// SAFETY: the entry function takes no arguments and returns a
		// pointer to a descriptor with static storage inside the library.
		let raw = unsafe { entry() };
		if raw.is_null() {
			return Err(PluginError::MissingSymbol {
				path: display,
				symbol: String::from_utf8_lossy(ENTRY_SYMBOL).to_string(),
			});
		}

		// SAFETY: non-null descriptor pointer from the entry symbol; copy
		// it into host-owned storage so later calls do not depend on the
		// plugin keeping the original alive.
		let descriptor = unsafe { *raw };
		let name = string_field(descriptor.name, "unknown");
		let version = string_field(descriptor.version, "0");

		Ok(NativePlugin {
			descriptor,
			_library: library,
			name,
			version,
			position,
			ctx: std::ptr::null_mut(),
		})
	}

	/// Position of this plugin in the chain
	pub fn position(&self) -> usize {
		self.position
	}

	/// Copy a plugin-returned buffer into host memory and release the
	/// original with the C allocator.
	#[allow(unsafe_code)]
	fn take_buffer(ptr: *mut u8, len: usize) -> Vec<u8> {
		if ptr.is_null() || len == 0 {
			return Vec::new();
		}
		// SAFETY: the plugin contract says (ptr, len) is a readable
		// malloc-allocated buffer owned by the host after the call.
		let out = unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec();
		// SAFETY: same contract; the host releases the buffer exactly once.
		unsafe { libc::free(ptr as *mut c_void) };
		out
	}
}

impl ContentPlugin for NativePlugin {
	fn name(&self) -> &str {
		&self.name
	}

	fn version(&self) -> &str {
		&self.version
	}

	#[allow(unsafe_code)]
	fn init(&mut self) -> Result<(), PluginError> {
		if let Some(init) = self.descriptor.init {
			// SAFETY: init takes no arguments and is called at most once.
			let status = unsafe { init() };
			if status != 0 {
				return Err(PluginError::InitFailed { name: self.name.clone(), status });
			}
		}
		Ok(())
	}

	#[allow(unsafe_code)]
	fn cleanup(&mut self) {
		if let Some(cleanup) = self.descriptor.cleanup {
			// SAFETY: cleanup takes no arguments and is called at most
			// once, after all per-file contexts are released.
			unsafe { cleanup() };
		}
	}

	#[allow(unsafe_code)]
	fn file_start(&mut self, relative_path: &str) -> bool {
		let Some(file_start) = self.descriptor.file_start else {
			return false;
		};
		let Ok(c_path) = CString::new(relative_path) else {
			return false;
		};
		// SAFETY: the path pointer is valid for the duration of the call;
		// the returned context is owned by the plugin until file_cleanup.
		self.ctx = unsafe { file_start(c_path.as_ptr()) };
		!self.ctx.is_null()
	}

	#[allow(unsafe_code)]
	fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
		let Some(process_chunk) = self.descriptor.process_chunk else {
			return Ok(Vec::new());
		};

		let mut out_ptr: *mut u8 = std::ptr::null_mut();
		let mut out_len: usize = 0;
		// SAFETY: input stays borrowed for the call; out parameters point
		// to stack locals the plugin fills in on success.
		let status = unsafe {
			process_chunk(self.ctx, input.as_ptr(), input.len(), &mut out_ptr, &mut out_len)
		};
		if status != 0 {
			return Err(PluginError::ChunkFailed { name: self.name.clone(), status });
		}
		Ok(Self::take_buffer(out_ptr, out_len))
	}

	#[allow(unsafe_code)]
	fn file_end(&mut self) -> Result<Vec<u8>, PluginError> {
		let Some(file_end) = self.descriptor.file_end else {
			return Ok(Vec::new());
		};

		let mut out_ptr: *mut u8 = std::ptr::null_mut();
		let mut out_len: usize = 0;
		// SAFETY: same contract as process_chunk, without an input buffer.
		let status = unsafe { file_end(self.ctx, &mut out_ptr, &mut out_len) };
		if status != 0 {
			return Err(PluginError::ChunkFailed { name: self.name.clone(), status });
		}
		Ok(Self::take_buffer(out_ptr, out_len))
	}

	#[allow(unsafe_code)]
	fn file_cleanup(&mut self) {
		if let Some(file_cleanup) = self.descriptor.file_cleanup {
			if !self.ctx.is_null() {
				// SAFETY: the context came from this plugin's file_start
				// and is released exactly once.
				unsafe { file_cleanup(self.ctx) };
			}
		}
		self.ctx = std::ptr::null_mut();
	}
}

fn string_field(ptr: *const c_char, fallback: &str) -> String {
	if ptr.is_null() {
		return fallback.to_string();
	}
	// SAFETY: non-null metadata pointers are NUL-terminated strings with
	// static storage inside the plugin library.
	#[allow(unsafe_code)]
	let text = unsafe { CStr::from_ptr(ptr) };
	text.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_load_missing_library() {
		let err = NativePlugin::load(Path::new("/nonexistent/plugin.so"), 0).unwrap_err();
		assert!(matches!(err, PluginError::LoadFailed { .. }));
	}

	#[test]
	fn test_take_buffer_null_is_empty() {
		assert!(NativePlugin::take_buffer(std::ptr::null_mut(), 0).is_empty());
		assert!(NativePlugin::take_buffer(std::ptr::null_mut(), 16).is_empty());
	}

	#[test]
	fn test_string_field_fallbacks() {
		assert_eq!(string_field(std::ptr::null(), "unknown"), "unknown");
	}
}
