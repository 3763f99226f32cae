use std::fmt::{self, Debug, Formatter};

/// An opaque API key used to authenticate with the model provider.
///
/// The key is never validated, it is passed through to the provider as
/// is. A key that is empty or only contains whitespace is treated as
/// absent, see [`Credentials::new`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials(String);

impl Credentials {
    /// Creates credentials from an API key.
    ///
    /// Returns `None` if the key is blank.
    #[inline]
    pub fn new<S: Into<String>>(api_key: S) -> Option<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self(api_key))
    }

    /// Returns the raw API key.
    #[inline]
    pub fn api_key(&self) -> &str {
        &self.0
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credentials").field(&"<redacted>").finish()
    }
}
