//! Empreintes de contenu (SHA-256)

use crate::sequence::Sequence;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Empreinte SHA-256 en hexadécimal minuscule (64 caractères)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Reprend une empreinte stockée (base de données, registre)
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Forme courte pour l'affichage (16 premiers caractères)
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(16)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Calcule l'empreinte d'un contenu arbitraire
pub fn fingerprint(content: &str) -> Fingerprint {
    fingerprint_bytes(content.as_bytes())
}

/// Calcule l'empreinte d'octets arbitraires
pub fn fingerprint_bytes(content: &[u8]) -> Fingerprint {
    let hash = Sha256::digest(content);
    Fingerprint(format!("{:x}", hash))
}

/// Empreinte d'une séquence normalisée, indépendante du sujet et de l'analyste
pub fn sequence_fingerprint(sequence: &Sequence) -> Fingerprint {
    fingerprint(sequence.as_str())
}
