//! Multi-file configuration loading.
//!
//! A root file may pull in other files with `include`. Included files may
//! include further files. Top-level sections must be unique across the whole
//! include tree so that no file silently overrides another.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a root configuration file together with everything it includes.
pub(crate) struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths of every file read so far.
	loaded_files: HashSet<PathBuf>,
	/// Section name to the file that defined it.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub(crate) fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads `config_path` and its includes into a validated [`Config`].
	pub(crate) async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let root_path = self.resolve_path(&self.base_path, config_path.as_ref())?;
		let root_content = self.read_resolved(&root_path).await?;
		let mut root: toml::Table = toml::from_str(&root_content)?;

		let includes = take_includes(&mut root)?;
		if includes.is_empty() {
			tracing::debug!(path = %root_path.display(), "Loaded configuration");
			return root_content.parse();
		}

		self.record_sections(&root, &root_path)?;
		let root_dir = parent_dir(&root_path);
		self.merge_includes(&mut root, includes, &root_dir).await?;

		tracing::debug!(
			path = %root_path.display(),
			files = self.loaded_files.len(),
			"Loaded configuration with includes"
		);

		let combined = toml::to_string(&root).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		combined.parse()
	}

	/// Reads every include (depth-first) and moves its sections into `target`.
	async fn merge_includes(
		&mut self,
		target: &mut toml::Table,
		includes: Vec<PathBuf>,
		relative_to: &Path,
	) -> Result<(), ConfigError> {
		let mut pending: Vec<(PathBuf, PathBuf)> = includes
			.into_iter()
			.rev()
			.map(|p| (relative_to.to_path_buf(), p))
			.collect();

		while let Some((dir, include)) = pending.pop() {
			let path = self.resolve_path(&dir, &include)?;
			let content = self.read_resolved(&path).await?;
			let mut table: toml::Table = toml::from_str(&content)?;

			let nested = take_includes(&mut table)?;
			let nested_dir = parent_dir(&path);
			pending.extend(nested.into_iter().rev().map(|p| (nested_dir.clone(), p)));

			self.record_sections(&table, &path)?;
			target.extend(table);
		}

		Ok(())
	}

	/// Registers the sections of `table` as coming from `source`.
	fn record_sections(&mut self, table: &toml::Table, source: &Path) -> Result<(), ConfigError> {
		for key in table.keys() {
			if let Some(existing) = self.section_sources.get(key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					key,
					existing.display(),
					source.display()
				)));
			}
			self.section_sources
				.insert(key.clone(), source.to_path_buf());
		}
		Ok(())
	}

	/// Reads a file once and resolves its environment placeholders.
	async fn read_resolved(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	fn resolve_path(&self, relative_to: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			relative_to.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

fn parent_dir(path: &Path) -> PathBuf {
	path.parent()
		.map(Path::to_path_buf)
		.unwrap_or_else(|| PathBuf::from("."))
}

/// Removes the `include` key from `table` and returns the listed paths.
fn take_includes(table: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
