//! # Listener handles and callback type.
//!
//! A listener is a plain callback invoked synchronously on every write to its
//! key. Registration returns a [`ListenerId`], a short random token used to
//! remove the listener later. Tokens are best-effort unique: the store re-rolls
//! on collision within one entry, so uniqueness holds per key, not globally.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

/// Callback invoked with a reference to the freshly written value.
///
/// Runs synchronously inside the writing call, outside the store lock, so a
/// listener may call any store method (including on its own key).
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Alphabet for listener tokens, uppercase keyboard rows.
const ALPHABET: &[u8] = b"QWERTYUIOPASDFGHJZXCVB";

/// Token length (22^6 possible tokens per entry).
const TOKEN_LEN: usize = 6;

/// Opaque handle identifying one registered listener on one key.
///
/// Obtained from [`Store::subscribe`](crate::Store::subscribe) and passed back
/// to [`Store::unsubscribe`](crate::Store::unsubscribe). Cheap to clone, safe
/// to keep after removal (a stale id is simply ignored).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(String);

impl ListenerId {
    /// Generates a fresh random token.
    ///
    /// Collision handling is the caller's job: the entry re-rolls until the
    /// token is unused within its listener list.
    pub(crate) fn generate() -> Self {
        let mut rng = rand::rng();
        let token: String = (0..TOKEN_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
