use std::ops::Deref;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("at least one API key is required")]
pub struct EmptyKeyPool;

/// Round-robin pool of API keys shared across workers.
///
/// `lease` blocks until a key is free; the lease returns its key to the
/// pool on drop, on the success and failure paths alike.
#[derive(Clone)]
pub struct KeyPool {
    tx: Sender<String>,
    rx: Receiver<String>,
    size: usize,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Result<Self, EmptyKeyPool> {
        if keys.is_empty() {
            return Err(EmptyKeyPool);
        }
        let size = keys.len();
        let (tx, rx) = crossbeam_channel::unbounded();
        for key in keys {
            // unbounded send cannot fail while the receiver is alive
            let _ = tx.send(key);
        }
        Ok(Self { tx, rx, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Take the next free key, blocking until one is returned if the pool
    /// is exhausted.
    pub fn lease(&self) -> KeyLease<'_> {
        // cannot disconnect: the pool itself holds a sender
        let key = self
            .rx
            .recv()
            .expect("key pool channel disconnected while the pool is alive");
        KeyLease {
            pool: self,
            key: Some(key),
        }
    }
}

/// A leased key; dropping it returns the key to the pool.
pub struct KeyLease<'a> {
    pool: &'a KeyPool,
    key: Option<String>,
}

impl Deref for KeyLease<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let _ = self.pool.tx.send(key);
        }
    }
}
