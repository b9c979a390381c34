// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! Secrets follow the `VAR` / `VAR_FILE` convention: when `VAR_FILE` is set
//! the secret is read from that path (Docker and Kubernetes secret mounts),
//! otherwise `VAR` is used directly. A single trailing newline is stripped
//! from file contents.

use std::fs;
use std::path::PathBuf;

use rolesync_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load `var` (or `var_FILE`) from the process environment.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	load_secret_with(var, |name| std::env::var(name).ok())
}

/// Load `var` (or `var_FILE`) through an arbitrary lookup.
pub fn load_secret_with<F>(var: &str, lookup: F) -> Result<Option<SecretString>, SecretEnvError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");

	if let Some(path_str) = lookup(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(secret)));
	}

	Ok(lookup(var).map(SecretString::new))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| map.get(name).cloned()
	}

	#[test]
	fn returns_none_when_unset() {
		let result = load_secret_with("CLIENT_SECRET", lookup(&[])).unwrap();
		assert!(result.is_none());
	}

	#[test]
	fn reads_direct_value() {
		let result = load_secret_with("CLIENT_SECRET", lookup(&[("CLIENT_SECRET", "s3cret")])).unwrap();
		assert_eq!(result.unwrap().expose(), "s3cret");
	}

	#[test]
	fn file_takes_precedence_and_trailing_newline_is_stripped() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		let path = file.path().to_str().unwrap().to_string();

		let result = load_secret_with(
			"CLIENT_SECRET",
			lookup(&[("CLIENT_SECRET", "direct"), ("CLIENT_SECRET_FILE", path.as_str())]),
		)
		.unwrap();
		assert_eq!(result.unwrap().expose(), "from-file");
	}

	#[test]
	fn empty_file_path_is_an_error() {
		let result = load_secret_with("CLIENT_SECRET", lookup(&[("CLIENT_SECRET_FILE", "")]));
		assert!(matches!(result, Err(SecretEnvError::EmptyPath { .. })));
	}

	#[test]
	fn missing_file_is_an_error() {
		let result = load_secret_with(
			"CLIENT_SECRET",
			lookup(&[("CLIENT_SECRET_FILE", "/nonexistent/rolesync/secret")]),
		);
		assert!(matches!(result, Err(SecretEnvError::Io { .. })));
	}
}
