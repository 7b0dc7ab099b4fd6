use crate::core_auth::core_auth::PasswdEntry;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use log::warn;
use std::collections::HashMap;
use std::path::Path;

pub fn hash_password(password: &str) -> Result<String> {
    hash(password, DEFAULT_COST).context("Failed to hash password")
}

pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}

/// Reads a `user:bcrypt-hash` file, skipping blank lines and `#` comments.
pub fn load_passwd_file(path: &Path) -> Result<HashMap<String, PasswdEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read passwd file: {}", path.display()))?;

    let mut passwd_map = HashMap::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match PasswdEntry::from_line(line) {
            Some(entry) => {
                passwd_map.insert(entry.get_username().to_string(), entry);
            }
            None => warn!("Ignoring malformed passwd line {}", number + 1),
        }
    }
    Ok(passwd_map)
}
