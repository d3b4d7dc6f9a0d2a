//! Liveness tokens for in-flight fetches.
//!
//! A team switch or logout bumps the generation. Each fetch captures a
//! token before awaiting and commits only while the token is still
//! current, so a stale completion can never overwrite the successor
//! context's view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic generation counter shared by all outstanding fetches.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    counter: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every outstanding token.
    pub fn bump(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// A token tied to the current generation.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            seen: self.counter.load(Ordering::SeqCst),
            counter: self.counter.clone(),
        }
    }
}

/// See [`Generation`].
#[derive(Debug, Clone)]
pub struct GenerationToken {
    seen: u64,
    counter: Arc<AtomicU64>,
}

impl GenerationToken {
    /// True while no bump has happened since the token was taken.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_goes_stale_on_bump() {
        let generation = Generation::new();
        let token = generation.token();
        assert!(token.is_current());

        generation.bump();
        assert!(!token.is_current());
        assert!(generation.token().is_current());
    }

    #[test]
    fn test_tokens_are_independent() {
        let generation = Generation::new();
        let before = generation.token();
        generation.bump();
        let after = generation.token();
        generation.bump();

        assert!(!before.is_current());
        assert!(!after.is_current());
    }
}
