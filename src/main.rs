use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use fconcat::concat::ConcatBuilder;
use fconcat::config::{BinaryPolicy, FileConfig, SymlinkPolicy};
use fconcat::logging::{self, error, info};

fn cli() -> Command {
	Command::new("fconcat")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Concatenate a directory tree into a single text artifact")
		.arg(Arg::new("input").required(true).value_name("INPUT_DIR").help("Directory to serialize"))
		.arg(Arg::new("output").required(true).value_name("OUTPUT_FILE").help("Output file path"))
		.arg(
			Arg::new("exclude")
				.long("exclude")
				.value_name("PATTERN")
				.action(ArgAction::Append)
				.num_args(1..)
				.help("Wildcard patterns to exclude (repeatable)"),
		)
		.arg(
			Arg::new("show-size")
				.long("show-size")
				.short('s')
				.action(ArgAction::SetTrue)
				.help("Show entry sizes and a total-size footer"),
		)
		.arg(
			Arg::new("binary-skip")
				.long("binary-skip")
				.action(ArgAction::SetTrue)
				.help("Omit binary file contents (default)"),
		)
		.arg(
			Arg::new("binary-include")
				.long("binary-include")
				.action(ArgAction::SetTrue)
				.help("Include binary file contents verbatim"),
		)
		.arg(
			Arg::new("binary-placeholder")
				.long("binary-placeholder")
				.action(ArgAction::SetTrue)
				.help("Replace binary file contents with a placeholder"),
		)
		.arg(
			Arg::new("symlinks")
				.long("symlinks")
				.value_name("MODE")
				.help("Symlink mode: skip, follow, include, placeholder"),
		)
		.arg(
			Arg::new("plugin")
				.long("plugin")
				.value_name("PATH")
				.action(ArgAction::Append)
				.help("Load a content plugin (repeatable, order preserved)"),
		)
		.arg(
			Arg::new("interactive")
				.long("interactive")
				.action(ArgAction::SetTrue)
				.help("Stay alive after the run until signaled"),
		)
		.arg(
			Arg::new("config")
				.long("config")
				.value_name("FILE")
				.help("Read defaults from an explicit TOML config file"),
		)
}

fn main() -> ExitCode {
	let matches = cli().get_matches();

	let input = matches.get_one::<String>("input").expect("required arg");
	let output = matches.get_one::<String>("output").expect("required arg");

	let mut builder = ConcatBuilder::new(input)
		.output(output)
		.verbose(logging::verbose_from_env());
	logging::init_tracing(builder.config().verbose);

	let file_config =
		match FileConfig::discover(matches.get_one::<String>("config").map(Path::new)) {
			Ok(file_config) => file_config,
			Err(message) => {
				error!("{}", message);
				return ExitCode::FAILURE;
			}
		};

	// Config-file layer first; CLI flags override it below
	for pattern in &file_config.exclude {
		builder = builder.exclude(pattern);
	}
	if let Some(show_size) = file_config.show_size {
		builder = builder.show_size(show_size);
	}
	if let Some(binary) = file_config.binary {
		builder = builder.binary_policy(binary);
	}
	if let Some(symlinks) = file_config.symlinks {
		builder = builder.symlink_policy(symlinks);
	}

	if let Some(patterns) = matches.get_many::<String>("exclude") {
		for pattern in patterns {
			builder = builder.exclude(pattern);
		}
	}

	if matches.get_flag("show-size") {
		builder = builder.show_size(true);
	}

	if matches.get_flag("binary-include") {
		builder = builder.binary_policy(BinaryPolicy::Include);
	} else if matches.get_flag("binary-placeholder") {
		builder = builder.binary_policy(BinaryPolicy::Placeholder);
	} else if matches.get_flag("binary-skip") {
		builder = builder.binary_policy(BinaryPolicy::Skip);
	}

	if let Some(mode) = matches.get_one::<String>("symlinks") {
		match SymlinkPolicy::from_str(mode) {
			Ok(policy) => builder = builder.symlink_policy(policy),
			Err(message) => {
				error!("{}", message);
				return ExitCode::FAILURE;
			}
		}
	}

	if let Some(plugins) = matches.get_many::<String>("plugin") {
		for path in plugins {
			builder = builder.plugin_path(PathBuf::from(path));
		}
	}

	if matches.get_flag("interactive") {
		builder = builder.interactive(true);
	}

	match builder.run() {
		Ok(summary) => {
			info!(
				"Done: {} files, {} directories, {} symlinks, {} bytes in {:.2?}",
				summary.files,
				summary.dirs,
				summary.symlinks,
				summary.bytes_written,
				summary.elapsed
			);
			ExitCode::SUCCESS
		}
		Err(e) => {
			error!("{}", e);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
