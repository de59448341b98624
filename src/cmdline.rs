// src/cmdline.rs

//! Structured command specification.
//!
//! An alternative to writing raw shell lines in the pipeline file: the
//! program, positional arguments, and flags are declared separately and
//! rendered into a single correctly-quoted shell command.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A command declared field by field instead of as one shell string.
///
/// ```toml
/// [job.analyse.command]
/// program = "python"
/// args = ["analyse.py"]
/// flags = { "--input" = "data file.h5", "--verbose" = "" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Flags in sorted order. An empty value renders the flag alone.
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Render to a single shell line with every piece quoted as needed.
    pub fn render(&self) -> String {
        let mut parts = vec![shell_quote(&self.program)];
        for arg in &self.args {
            parts.push(shell_quote(arg));
        }
        for (flag, value) in &self.flags {
            parts.push(shell_quote(flag));
            if !value.is_empty() {
                parts.push(shell_quote(value));
            }
        }
        parts.join(" ")
    }
}

/// Quote a word for POSIX `sh`. Words made only of safe characters pass
/// through untouched; everything else is single-quoted with embedded single
/// quotes escaped as `'\''`.
pub fn shell_quote(word: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        return word.to_string();
    }
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('\'');
    for c in word.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
