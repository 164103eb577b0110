/// Plugin pipeline behavior through full runs: chain order, carry-over
/// across chunk boundaries, the local fallback policy and load failures.
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use fconcat::concat::ConcatBuilder;
use fconcat::error::{ConcatError, PluginError};
use fconcat::plugin::ContentPlugin;

fn create_file(dir: &Path, name: &str, content: &[u8]) {
	fs::write(dir.join(name), content).unwrap();
}

fn contents_section(text: &str) -> &str {
	text.split("File Contents:\n=============\n\n").nth(1).unwrap()
}

/// Stateless uppercase transformer
struct Upcase;

impl ContentPlugin for Upcase {
	fn name(&self) -> &str {
		"upcase"
	}
	fn version(&self) -> &str {
		"1.0"
	}
	fn file_start(&mut self, _relative_path: &str) -> bool {
		true
	}
	fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
		Ok(input.to_ascii_uppercase())
	}
	fn file_end(&mut self) -> Result<Vec<u8>, PluginError> {
		Ok(Vec::new())
	}
	fn file_cleanup(&mut self) {}
}

/// Prefixes every line, carrying the line-start flag across chunks
struct LinePrefix {
	at_line_start: bool,
}

impl ContentPlugin for LinePrefix {
	fn name(&self) -> &str {
		"prefix"
	}
	fn version(&self) -> &str {
		"1.0"
	}
	fn file_start(&mut self, _relative_path: &str) -> bool {
		self.at_line_start = true;
		true
	}
	fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
		let mut out = Vec::with_capacity(input.len() + 2);
		for &byte in input {
			if self.at_line_start {
				out.extend_from_slice(b"> ");
				self.at_line_start = false;
			}
			out.push(byte);
			if byte == b'\n' {
				self.at_line_start = true;
			}
		}
		Ok(out)
	}
	fn file_end(&mut self) -> Result<Vec<u8>, PluginError> {
		Ok(Vec::new())
	}
	fn file_cleanup(&mut self) {}
}

/// Replaces every occurrence of NEEDLE, buffering a possible partial match
/// at the end of each chunk so matches spanning chunk boundaries work
struct Detector {
	carry: Vec<u8>,
}

const NEEDLE: &[u8] = b"NEEDLE";
const REPLACEMENT: &[u8] = b"<FOUND>";

impl Detector {
	fn new() -> Self {
		Detector { carry: Vec::new() }
	}

	fn transform(data: &[u8]) -> (Vec<u8>, Vec<u8>) {
		let mut out = Vec::with_capacity(data.len());
		let mut i = 0;
		while i < data.len() {
			if data[i..].starts_with(NEEDLE) {
				out.extend_from_slice(REPLACEMENT);
				i += NEEDLE.len();
				continue;
			}
			// A needle prefix at the tail may complete in the next chunk
			let remaining = data.len() - i;
			if remaining < NEEDLE.len() && NEEDLE.starts_with(&data[i..]) {
				return (out, data[i..].to_vec());
			}
			out.push(data[i]);
			i += 1;
		}
		(out, Vec::new())
	}
}

impl ContentPlugin for Detector {
	fn name(&self) -> &str {
		"detector"
	}
	fn version(&self) -> &str {
		"1.0"
	}
	fn file_start(&mut self, _relative_path: &str) -> bool {
		self.carry.clear();
		true
	}
	fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
		let mut data = std::mem::take(&mut self.carry);
		data.extend_from_slice(input);
		let (out, carry) = Self::transform(&data);
		self.carry = carry;
		Ok(out)
	}
	fn file_end(&mut self) -> Result<Vec<u8>, PluginError> {
		Ok(std::mem::take(&mut self.carry))
	}
	fn file_cleanup(&mut self) {
		self.carry.clear();
	}
}

/// Fails on every chunk
struct Faulty;

impl ContentPlugin for Faulty {
	fn name(&self) -> &str {
		"faulty"
	}
	fn version(&self) -> &str {
		"1.0"
	}
	fn file_start(&mut self, _relative_path: &str) -> bool {
		true
	}
	fn process_chunk(&mut self, _input: &[u8]) -> Result<Vec<u8>, PluginError> {
		Err(PluginError::ChunkFailed { name: "faulty".to_string(), status: -1 })
	}
	fn file_end(&mut self) -> Result<Vec<u8>, PluginError> {
		Ok(Vec::new())
	}
	fn file_cleanup(&mut self) {}
}

// ===================================================================
// CHAIN BEHAVIOR
// ===================================================================

#[test]
fn test_upcase_then_prefix_chain() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", b"ab\ncd");

	let mut sink = Vec::new();
	ConcatBuilder::new(dir.path())
		.plugin(Box::new(Upcase))
		.plugin(Box::new(LinePrefix { at_line_start: true }))
		.write_to(&mut sink)
		.unwrap();
	let text = String::from_utf8(sink).unwrap();

	assert_eq!(contents_section(&text), "// File: a.txt\n> AB\n> CD\n\n");
}

#[test]
fn test_zero_plugins_copy_verbatim() {
	let dir = TempDir::new().unwrap();
	let body = "héllo → wörld\nwith\ttabs\n";
	create_file(dir.path(), "a.txt", body.as_bytes());

	let mut sink = Vec::new();
	ConcatBuilder::new(dir.path()).write_to(&mut sink).unwrap();
	let text = String::from_utf8(sink).unwrap();

	assert_eq!(contents_section(&text), format!("// File: a.txt\n{}\n\n", body));
}

#[test]
fn test_detector_across_chunk_boundary() {
	// Place the trigger word so it straddles the 4096-byte chunk boundary
	let mut body = vec![b'x'; 4093];
	body.extend_from_slice(b"NEEDLE");
	body.extend_from_slice(b" tail");

	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "big.txt", &body);

	let mut sink = Vec::new();
	ConcatBuilder::new(dir.path())
		.plugin(Box::new(Detector::new()))
		.write_to(&mut sink)
		.unwrap();
	let text = String::from_utf8(sink).unwrap();

	// Streamed output equals a whole-buffer application of the detector
	let (mut expected, tail) = Detector::transform(&body);
	expected.extend(tail);
	let expected_text = String::from_utf8(expected).unwrap();

	assert!(text.contains("<FOUND>"));
	assert!(!text.contains("NEEDLE"));
	assert_eq!(contents_section(&text), format!("// File: big.txt\n{}\n\n", expected_text));
}

#[test]
fn test_trailing_partial_match_flushes_at_file_end() {
	// The file ends with an incomplete needle prefix; file_end must flush
	// the held-back bytes
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", b"data NEED");

	let mut sink = Vec::new();
	ConcatBuilder::new(dir.path())
		.plugin(Box::new(Detector::new()))
		.write_to(&mut sink)
		.unwrap();
	let text = String::from_utf8(sink).unwrap();

	assert_eq!(contents_section(&text), "// File: a.txt\ndata NEED\n\n");
}

#[test]
fn test_faulty_plugin_contribution_is_discarded() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", b"ab");

	let mut sink = Vec::new();
	ConcatBuilder::new(dir.path())
		.plugin(Box::new(Faulty))
		.plugin(Box::new(Upcase))
		.write_to(&mut sink)
		.unwrap();
	let text = String::from_utf8(sink).unwrap();

	// Faulty's output is dropped for the chunk; Upcase still runs on the
	// unchanged input and the run completes
	assert_eq!(contents_section(&text), "// File: a.txt\nAB\n\n");
}

#[test]
fn test_per_file_state_resets_between_files() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", b"x NEED");
	create_file(dir.path(), "b.txt", b"LE y");

	let mut sink = Vec::new();
	ConcatBuilder::new(dir.path())
		.plugin(Box::new(Detector::new()))
		.write_to(&mut sink)
		.unwrap();
	let text = String::from_utf8(sink).unwrap();

	// The partial match held at the end of a.txt must not leak into
	// b.txt: no replacement happens across file boundaries
	assert!(text.contains("// File: a.txt\nx NEED\n\n"));
	assert!(text.contains("// File: b.txt\nLE y\n\n"));
	assert!(!text.contains("<FOUND>"));
}

// ===================================================================
// LOAD FAILURES
// ===================================================================

#[test]
fn test_missing_shared_object_is_fatal() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", b"x");

	let mut sink = Vec::new();
	let err = ConcatBuilder::new(dir.path())
		.plugin_path("/nonexistent/plugin.so")
		.write_to(&mut sink)
		.unwrap_err();

	assert!(matches!(err, ConcatError::Plugin(PluginError::LoadFailed { .. })));
}

#[test]
fn test_object_without_entry_symbol_is_fatal() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", b"x");

	// libc is always present and certainly does not export the plugin
	// entry point
	let candidates = ["/lib/x86_64-linux-gnu/libc.so.6", "/usr/lib/libc.so.6", "/lib/libc.so.6"];
	let Some(libc_path) = candidates.into_iter().find(|p| Path::new(p).exists()) else {
		return;
	};

	let mut sink = Vec::new();
	let err = ConcatBuilder::new(dir.path())
		.plugin_path(libc_path)
		.write_to(&mut sink)
		.unwrap_err();

	assert!(matches!(err, ConcatError::Plugin(PluginError::MissingSymbol { .. })));
}
