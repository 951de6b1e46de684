//! Rotating pool of interchangeable API credentials.
//!
//! The pool itself never changes after construction; only the cursor
//! moves. Rotation is round-robin and uses compare-and-swap from the index
//! the caller observed, so concurrent submissions that fail on the same
//! credential advance the cursor once rather than skipping entries.

use std::sync::atomic::{AtomicUsize, Ordering};

use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, thiserror::Error)]
pub enum CredentialPoolError {
    #[error("Credential pool must contain at least one credential")]
    Empty,
}

/// Ordered, non-empty set of API tokens with a shared cursor.
#[derive(Debug)]
pub struct CredentialPool {
    credentials: Vec<SecretString>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    pub fn new(credentials: Vec<SecretString>) -> Result<Self, CredentialPoolError> {
        if credentials.is_empty() {
            return Err(CredentialPoolError::Empty);
        }
        Ok(Self {
            credentials,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Build a pool from plain tokens, skipping blank entries.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, CredentialPoolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = tokens
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .collect();
        Self::new(credentials)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Always `false`; construction rejects empty pools.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Index of the credential new jobs should use.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Expose the credential at `index` (wrapped into range).
    pub fn credential(&self, index: usize) -> &str {
        self.credentials[index % self.credentials.len()].expose_secret()
    }

    /// Advance the cursor past `observed`, returning the index now current.
    ///
    /// If another caller already moved the cursor away from `observed`,
    /// the cursor is left alone and its current value is returned.
    pub fn rotate_from(&self, observed: usize) -> usize {
        let next = (observed + 1) % self.credentials.len();
        match self
            .cursor
            .compare_exchange(observed, next, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => next,
            Err(current) => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    fn pool(tokens: &[&str]) -> CredentialPool {
        CredentialPool::from_tokens(tokens.iter().copied()).unwrap()
    }

    #[test]
    fn empty_pool_rejected() {
        assert_matches!(
            CredentialPool::from_tokens(Vec::<String>::new()),
            Err(CredentialPoolError::Empty)
        );
        assert_matches!(
            CredentialPool::from_tokens(["", "  "]),
            Err(CredentialPoolError::Empty)
        );
    }

    #[test]
    fn blank_tokens_skipped() {
        let p = pool(&["a", " ", "b "]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.credential(1), "b");
    }

    #[test]
    fn rotation_is_circular() {
        let p = pool(&["a", "b", "c"]);
        assert_eq!(p.cursor(), 0);
        assert_eq!(p.rotate_from(0), 1);
        assert_eq!(p.rotate_from(1), 2);
        assert_eq!(p.rotate_from(2), 0);
        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn single_credential_rotates_onto_itself() {
        let p = pool(&["only"]);
        assert_eq!(p.rotate_from(0), 0);
        assert_eq!(p.credential(p.cursor()), "only");
    }

    #[test]
    fn stale_rotation_does_not_skip() {
        let p = pool(&["a", "b", "c"]);
        assert_eq!(p.rotate_from(0), 1);
        // A second caller that also saw index 0 must not advance again.
        assert_eq!(p.rotate_from(0), 1);
        assert_eq!(p.cursor(), 1);
    }

    #[test]
    fn concurrent_rotation_from_same_index_advances_once() {
        let p = Arc::new(pool(&["a", "b", "c", "d"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || p.rotate_from(0))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert_eq!(p.cursor(), 1);
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let p = pool(&["r8_supersecret"]);
        assert!(!format!("{p:?}").contains("supersecret"));
    }
}
