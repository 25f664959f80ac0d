#[cfg(test)]
#[path = "key_rotator_test.rs"]
mod tests;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use anyhow::bail;
use anyhow::Result;

/// Pool of upstream credentials with a circular cursor. Owned by whoever
/// builds the controller so separate controllers never share a cursor.
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Result<KeyRotator> {
        if keys.is_empty() {
            bail!("At least one API key is required. Set `api-keys` in the config file or SAKHA_API_KEYS.");
        }

        return Ok(KeyRotator {
            keys,
            cursor: AtomicUsize::new(0),
        });
    }

    pub fn pool_size(&self) -> usize {
        return self.keys.len();
    }

    pub fn index(&self) -> usize {
        return self.cursor.load(Ordering::SeqCst) % self.keys.len();
    }

    pub fn current_key(&self) -> &str {
        return &self.keys[self.index()];
    }

    /// Advances to the next key, wrapping around. Returns the new index.
    pub fn rotate(&self) -> usize {
        let len = self.keys.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cursor| {
                return Some((cursor + 1) % len);
            })
            .unwrap_or_default();

        return (previous + 1) % len;
    }
}
