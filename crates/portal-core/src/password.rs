//! the `<id>-<wordA>-<wordB>-<wordC>` password: the rendezvous-assigned
//! session id plus the three-word weak secret fed to PAKE.

use crate::error::PortalError;
use crate::wordlist::{self, random_words};

/// a parsed password: `id` is the rendezvous session id, `words` is the
/// weak shared secret. the rendezvous only ever sees `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Password {
    pub id: u32,
    pub words: [String; 3],
}

impl Password {
    /// build a fresh password for a sender that was just assigned `id`.
    pub fn generate(id: u32) -> Self {
        let [a, b, c] = random_words();
        Self {
            id,
            words: [a.to_string(), b.to_string(), c.to_string()],
        }
    }

    /// the weak-secret bytes fed into PAKE: the three words joined by `-`.
    pub fn weak_secret(&self) -> Vec<u8> {
        self.words.join("-").into_bytes()
    }

    /// parse `id-wordA-wordB-wordC`, matching `^[1-9][0-9]*-[a-z]+-[a-z]+-[a-z]+$`.
    pub fn parse(s: &str) -> Result<Self, PortalError> {
        let s = s.trim();
        let mut parts = s.splitn(4, '-');

        let id_str = parts.next().ok_or(PortalError::MalformedPassword)?;
        let a = parts.next().ok_or(PortalError::MalformedPassword)?;
        let b = parts.next().ok_or(PortalError::MalformedPassword)?;
        let c = parts.next().ok_or(PortalError::MalformedPassword)?;

        if parts.next().is_some() {
            return Err(PortalError::MalformedPassword);
        }

        if id_str.is_empty() || id_str.starts_with('0') || !id_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PortalError::MalformedPassword);
        }
        let id: u32 = id_str.parse().map_err(|_| PortalError::MalformedPassword)?;

        for word in [a, b, c] {
            if word.is_empty() || !word.bytes().all(|b| b.is_ascii_lowercase()) || !wordlist::contains(word) {
                return Err(PortalError::MalformedPassword);
            }
        }

        Ok(Self {
            id,
            words: [a.to_string(), b.to_string(), c.to_string()],
        })
    }
}

impl std::fmt::Display for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}-{}", self.id, self.words[0], self.words[1], self.words[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_display_and_parse() {
        let original = Password::generate(42);
        let rendered = original.to_string();
        let parsed = Password::parse(&rendered).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn rejects_malformed_passwords() {
        for bad in ["", "abc-a-b-c", "7", "7-a-b", "7-a-b-c-d", "07-a-b-c", "-7-a-b-c", "7-A-b-c"] {
            assert!(Password::parse(bad).is_err(), "expected {bad:?} to be rejected");
        }
    }

    #[test]
    fn accepts_well_formed_password() {
        let p = Password::parse("123-dragon-hamlet-cobra").unwrap();
        assert_eq!(p.id, 123);
        assert_eq!(p.words, ["dragon".to_string(), "hamlet".to_string(), "cobra".to_string()]);
    }

    #[test]
    fn rejects_words_not_in_the_wordlist() {
        assert!(Password::parse("123-alpha-bravo-charlie").is_err());
    }
}
