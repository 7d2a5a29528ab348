use anyhow::{ensure, Result};
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct Url {
	pub str: String,
}

impl Url {
	pub fn new(url: &str) -> Url {
		let str = if url.starts_with('/') { url.to_owned() } else { format!("/{url}") };
		Url { str }
	}

	pub fn starts_with(&self, url: &Url) -> bool {
		self.str.starts_with(&url.str)
	}

	pub fn is_dir(&self) -> bool {
		self.str.ends_with('/')
	}

	pub fn be_dir(&mut self) {
		if !self.str.ends_with('/') {
			self.str = format!("{}/", self.str)
		}
	}

	pub fn strip_prefix(&self, prefix: &Url) -> Result<Url> {
		ensure!(self.str.starts_with(&prefix.str), "url does not start with prefix");

		Ok(Url::new(&self.str[prefix.str.len()..]))
	}

	pub fn as_vec(&self) -> Vec<String> {
		self
			.str
			.split('/')
			.filter_map(|s| if s.is_empty() { None } else { Some(s.to_owned()) })
			.collect()
	}

	pub fn as_string(&self) -> String {
		self.str.to_owned()
	}

	pub fn as_path(&self, base: &Path) -> PathBuf {
		base.join(&self.str[1..])
	}

	pub fn push(&mut self, filename: &str) {
		self.str = self.join_as_string(filename)
	}

	pub fn join_as_string(&self, filename: &str) -> String {
		if self.is_dir() {
			format!("{}{}", self.str, filename)
		} else {
			format!("{}/{}", self.str, filename)
		}
	}
}

impl std::fmt::Display for Url {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.str)
	}
}
