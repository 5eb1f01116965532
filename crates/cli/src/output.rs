//! CLI output formatting utilities.
//!
//! Colored status lines on the terminal, or pretty JSON on stdout when
//! `--output json` is selected.

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const PLUS: &str = "+";
  pub const MINUS: &str = "-";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_bytes(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;
  const GB: u64 = MB * 1024;

  if bytes >= GB {
    format!("{:.1} GB", bytes as f64 / GB as f64)
  } else if bytes >= MB {
    format!("{:.1} MB", bytes as f64 / MB as f64)
  } else if bytes >= KB {
    format!("{:.1} KB", bytes as f64 / KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// Total size of regular files under `path`; symlinks are not followed.
pub fn dir_size(path: &Path) -> u64 {
  let Ok(entries) = std::fs::read_dir(path) else {
    return 0;
  };
  let mut size = 0;
  for entry in entries.flatten() {
    let Ok(file_type) = entry.file_type() else {
      continue;
    };
    if file_type.is_dir() {
      size += dir_size(&entry.path());
    } else if file_type.is_file() {
      size += entry.metadata().map(|m| m.len()).unwrap_or(0);
    }
  }
  size
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// A bullet line, `+` for enabled and `-` for disabled entries.
pub fn print_toggle(enabled: bool, message: &str) {
  if enabled {
    println!("  {} {}", symbols::PLUS.if_supports_color(Stream::Stdout, |s| s.green()), message);
  } else {
    println!(
      "  {} {}",
      symbols::MINUS.if_supports_color(Stream::Stdout, |s| s.red()),
      message.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
