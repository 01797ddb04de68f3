// src/exam/platform.rs

use std::fmt;

use async_trait::async_trait;

/// Browser features the exam asks for before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Fullscreen,
    /// Keyboard lock on Escape, so it cannot leave fullscreen.
    KeyboardLock,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Fullscreen => f.write_str("fullscreen"),
            Capability::KeyboardLock => f.write_str("keyboard-lock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    Granted,
    Denied(String),
}

/// The host the exam runs in (a browser tab, a kiosk shell, a test double).
///
/// Requests may be refused; the exam continues either way.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn request(&self, capability: Capability) -> Grant;

    /// Gives a capability back once the attempt is over. Best effort.
    async fn release(&self, capability: Capability);
}

/// A host with no fullscreen or keyboard-lock support at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPlatform;

#[async_trait]
impl Platform for UnsupportedPlatform {
    async fn request(&self, capability: Capability) -> Grant {
        Grant::Denied(format!("{} is not supported by this host", capability))
    }

    async fn release(&self, _capability: Capability) {}
}
