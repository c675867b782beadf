//! Keystream obfuscation
//!
//! The volume format obfuscates entry contents with an involutive XOR
//! keystream derived from the password (or from a fixed built-in key when
//! no password is set). This is deliberately not confidentiality-grade
//! encryption: the keystream is derivable and the password fingerprint is
//! a fixed-salt hash used only as an equality check at unpack time.
//! Changing either would break compatibility with existing volume sets.

/// Built-in key used when no password is supplied.
const DEFAULT_KEY: &[u8] = b"DefaultBackupKey2024!";

/// Fixed salt mixed into the password fingerprint.
const PASSWORD_SALT: &str = "BackupSalt2024";

/// Password-derived XOR transform. The same call encrypts and decrypts.
#[derive(Debug, Clone)]
pub struct KeystreamCipher {
    password: Vec<u8>,
}

impl KeystreamCipher {
    /// Build a cipher for `password`. An empty password selects the
    /// built-in default keystream.
    pub fn new(password: &str) -> Self {
        Self {
            password: password.as_bytes().to_vec(),
        }
    }

    /// Transform `data` in place. Involutive: applying the transform twice
    /// with the same password restores the original bytes.
    pub fn transform(&self, data: &mut [u8]) {
        if self.password.is_empty() {
            for (i, byte) in data.iter_mut().enumerate() {
                *byte ^= DEFAULT_KEY[i % DEFAULT_KEY.len()] ^ (i & 0xFF) as u8;
            }
        } else {
            let len = self.password.len();
            for (i, byte) in data.iter_mut().enumerate() {
                let base = self.password[i % len];
                let modifier = ((i / len) & 0xFF) as u8;
                *byte ^= base ^ modifier ^ (i & 0xFF) as u8;
            }
        }
    }

    /// Transform an owned buffer and hand it back.
    pub fn transform_vec(&self, mut data: Vec<u8>) -> Vec<u8> {
        self.transform(&mut data);
        data
    }
}

/// Stable hex fingerprint of a password, used as the manifest's
/// `encrypted:` marker. Equality check only; not a proof of possession.
pub fn password_hash(password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(password.as_bytes());
    hasher.update(PASSWORD_SALT.as_bytes());
    hasher.finalize().to_hex().to_string()
}
