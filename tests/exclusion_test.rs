/// Exclusion semantics exercised through full runs: matching patterns keep
/// entries out of both passes and short-circuit recursion into excluded
/// directories.
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use fconcat::concat::ConcatBuilder;

fn create_file(dir: &Path, name: &str, content: &str) {
	fs::write(dir.join(name), content).unwrap();
}

fn run_with_excludes(base: &Path, patterns: &[&str]) -> String {
	let mut builder = ConcatBuilder::new(base);
	for pattern in patterns {
		builder = builder.exclude(pattern);
	}
	let mut sink = Vec::new();
	builder.write_to(&mut sink).unwrap();
	String::from_utf8(sink).unwrap()
}

#[test]
fn test_excluded_extension_absent_from_both_passes() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "k.log", "log line");
	create_file(dir.path(), "k.txt", "x");

	let text = run_with_excludes(dir.path(), &["*.log"]);

	assert!(!text.contains("k.log"));
	assert!(text.contains("📄 k.txt\n"));
	assert!(text.contains("// File: k.txt\nx\n\n"));
}

#[test]
fn test_excluded_directory_skips_descendants() {
	let dir = TempDir::new().unwrap();
	fs::create_dir_all(dir.path().join("target/debug")).unwrap();
	create_file(&dir.path().join("target/debug"), "artifact.txt", "junk");
	create_file(dir.path(), "keep.txt", "keep");

	let text = run_with_excludes(dir.path(), &["target"]);

	// Exclusion short-circuits: neither the directory nor anything below
	// it appears in either pass
	assert!(!text.contains("target"));
	assert!(!text.contains("artifact.txt"));
	assert!(text.contains("// File: keep.txt\nkeep\n\n"));
}

#[test]
fn test_basename_pattern_matches_at_depth() {
	let dir = TempDir::new().unwrap();
	fs::create_dir(dir.path().join("sub")).unwrap();
	create_file(&dir.path().join("sub"), "notes.md", "n");
	create_file(dir.path(), "notes.md", "n");
	create_file(dir.path(), "other.md", "o");

	let text = run_with_excludes(dir.path(), &["notes.md"]);

	assert!(!text.contains("notes.md"));
	assert!(text.contains("other.md"));
}

#[test]
fn test_question_mark_pattern() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.c", "c");
	create_file(dir.path(), "a.rs", "rs");

	let text = run_with_excludes(dir.path(), &["a.?"]);

	assert!(!text.contains("a.c"));
	assert!(text.contains("a.rs"));
}

#[test]
fn test_duplicate_patterns_do_not_change_output() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.log", "l");
	create_file(dir.path(), "b.txt", "t");

	let once = run_with_excludes(dir.path(), &["*.log"]);
	let twice = run_with_excludes(dir.path(), &["*.log", "*.log", "*.log"]);

	assert_eq!(once, twice);
}

#[test]
fn test_invalid_pattern_is_dropped_not_fatal() {
	let dir = TempDir::new().unwrap();
	create_file(dir.path(), "a.txt", "x");

	// An uncompilable pattern is logged and dropped; the run proceeds
	let text = run_with_excludes(dir.path(), &["[oops"]);
	assert!(text.contains("// File: a.txt\nx\n\n"));
}
