//! Utility helpers
//!
//! This module contains small helpers including safe wrappers around
//! platform calls that require unsafe blocks.

use std::fs::Metadata;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identity of a filesystem object for cycle detection
///
/// Returns the `(device, inode)` pair on Unix. On platforms without stable
/// inode identities this returns None and symlink cycle detection degrades
/// to resolution-error detection only.
pub fn file_identity(metadata: &Metadata) -> Option<(u64, u64)> {
	#[cfg(unix)]
	{
		use std::os::unix::fs::MetadataExt;
		Some((metadata.dev(), metadata.ino()))
	}

	#[cfg(not(unix))]
	{
		let _ = metadata;
		None
	}
}

/// Whether an I/O error reports a symlink resolution loop (ELOOP)
pub fn is_filesystem_loop(error: &io::Error) -> bool {
	#[cfg(unix)]
	{
		error.raw_os_error() == Some(libc::ELOOP)
	}

	#[cfg(not(unix))]
	{
		let _ = error;
		false
	}
}

/// Set by the termination signal handler
static TERMINATED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn mark_terminated(_signal: libc::c_int) {
	TERMINATED.store(true, Ordering::SeqCst);
}

/// Block until SIGINT or SIGTERM arrives.
///
/// Used by interactive mode so long-lived plugins keep running after the
/// run completes; the caller performs plugin shutdown once this returns.
#[allow(unsafe_code)] // Safe wrapper around signal registration
pub fn wait_for_termination() {
	#[cfg(unix)]
	{
		// SAFETY: mark_terminated is async-signal-safe (a single atomic
		// store) and remains valid for the life of the process.
		unsafe {
			libc::signal(libc::SIGINT, mark_terminated as libc::sighandler_t);
			libc::signal(libc::SIGTERM, mark_terminated as libc::sighandler_t);
		}

		while !TERMINATED.load(Ordering::SeqCst) {
			std::thread::sleep(std::time::Duration::from_millis(50));
		}
	}

	#[cfg(not(unix))]
	{
		// No handler registration; the default disposition terminates the
		// process, so this wait only ends through an external kill.
		while !TERMINATED.load(Ordering::SeqCst) {
			std::thread::sleep(std::time::Duration::from_millis(50));
		}
	}
}


// vim: ts=4
