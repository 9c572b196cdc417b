//! Archive password held in zeroizing memory.

use zeroize::Zeroizing;

/// A password answered to the engine's password query.
///
/// The text lives in a [`Zeroizing`] buffer and is wiped when the last copy
/// is dropped. `Debug` output never shows it.
#[derive(Clone)]
pub struct Password {
    inner: Zeroizing<String>,
}

impl Password {
    /// Creates a password from a string.
    pub fn new<S: Into<String>>(password: S) -> Self {
        Self {
            inner: Zeroizing::new(password.into()),
        }
    }

    /// Returns the password text.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns true if the password is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the length in characters.
    pub fn len(&self) -> usize {
        self.inner.chars().count()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Password {}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_debug_redacted() {
        let password = Password::new("secret");
        let debug = format!("{:?}", password);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("len: 6"));
    }

    #[test]
    fn test_password_len_counts_chars() {
        let password = Password::new("пароль");
        assert_eq!(password.len(), 6);
        assert!(!password.is_empty());
        assert!(Password::new("").is_empty());
    }

    #[test]
    fn test_password_conversions() {
        let a: Password = "pw".into();
        let b: Password = String::from("pw").into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "pw");
    }
}
