//! Ed25519 transfer signing from a 24-word TON mnemonic.

use ed25519_dalek::{Signer, SigningKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::wallet::WalletError;
use crate::wallet_v4::TransferSigner;

pub const MNEMONIC_WORDS: usize = 24;

const SEED_SALT: &[u8] = b"TON default seed";
const SEED_ROUNDS: u32 = 100_000;
const BASIC_SALT: &[u8] = b"TON seed version";
/// `max(1, 100_000 / 256)`
const BASIC_ROUNDS: u32 = 390;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MnemonicError {
    #[error("mnemonic must have {MNEMONIC_WORDS} words, got {0}")]
    WordCount(usize),

    #[error("mnemonic is not a valid TON seed phrase")]
    NotBasicSeed,

    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Signs with the wallet key derived from a mnemonic. The key never leaves
/// this value and is not printed by `Debug`.
pub struct MnemonicSigner {
    key: SigningKey,
}

impl MnemonicSigner {
    /// Derive the key the way TON wallets do: words are lowercased and
    /// joined by single spaces, no password.
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        let words: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
        if words.len() != MNEMONIC_WORDS {
            return Err(MnemonicError::WordCount(words.len()));
        }
        let entropy = entropy(&words.join(" "))?;

        let mut basic = [0u8; 64];
        pbkdf2::pbkdf2_hmac::<Sha512>(&entropy, BASIC_SALT, BASIC_ROUNDS, &mut basic);
        if basic[0] != 0 {
            return Err(MnemonicError::NotBasicSeed);
        }

        let mut seed = [0u8; 64];
        pbkdf2::pbkdf2_hmac::<Sha512>(&entropy, SEED_SALT, SEED_ROUNDS, &mut seed);
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&seed[..32]);
        Ok(Self::from_secret(secret))
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&secret),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }
}

/// `HMAC-SHA512(key = phrase, message = password)` with an empty password.
fn entropy(phrase: &str) -> Result<[u8; 64], MnemonicError> {
    let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(phrase.as_bytes())
        .map_err(|e| MnemonicError::Derivation(e.to_string()))?;
    mac.update(b"");
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

impl std::fmt::Debug for MnemonicSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicSigner")
            .field("public_key", &HexKey(self.public_key()))
            .finish_non_exhaustive()
    }
}

struct HexKey([u8; 32]);

impl std::fmt::Debug for HexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl TransferSigner for MnemonicSigner {
    fn sign(&self, digest: &[u8; 32]) -> Result<[u8; 64], WalletError> {
        Ok(self.key.sign(digest).to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    const PHRASE: &str = "acquire acid abandon actress actual achieve able accident actor absent \
        across abuse abstract act access accuse account above acoustic ability about absurd \
        absorb action";

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn derives_known_keypair() {
        let signer = MnemonicSigner::from_phrase(PHRASE).unwrap();
        assert_eq!(
            hex(&signer.key.to_bytes()),
            "21fbf821ec1380ff09ed7ca374b8d0c57933f2397ad14d8f2953303688f58388"
        );
        assert_eq!(
            hex(&signer.public_key()),
            "d4ee474d7cdb03f263610f02c8c443ff80ecb2c4978a2b72f3408fdef3e3677f"
        );
    }

    #[test]
    fn case_and_spacing_do_not_matter() {
        let messy = format!("  {}\n", PHRASE.to_uppercase().replace(' ', "   "));
        let a = MnemonicSigner::from_phrase(PHRASE).unwrap();
        let b = MnemonicSigner::from_phrase(&messy).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn phrases_that_are_not_seeds_are_rejected() {
        let repeated = vec!["abandon"; 24].join(" ");
        assert_eq!(
            MnemonicSigner::from_phrase(&repeated).unwrap_err(),
            MnemonicError::NotBasicSeed
        );

        let mut sorted: Vec<&str> = PHRASE.split_whitespace().collect();
        sorted.sort_unstable();
        assert_eq!(
            MnemonicSigner::from_phrase(&sorted.join(" ")).unwrap_err(),
            MnemonicError::NotBasicSeed
        );
    }

    #[test]
    fn word_count_is_checked() {
        assert_eq!(
            MnemonicSigner::from_phrase("abandon ability").unwrap_err(),
            MnemonicError::WordCount(2)
        );
        assert_eq!(
            MnemonicSigner::from_phrase("").unwrap_err(),
            MnemonicError::WordCount(0)
        );
    }

    #[test]
    fn signatures_verify_against_public_key() {
        let signer = MnemonicSigner::from_secret([7; 32]);
        let digest = [0x5a; 32];
        let signature = signer.sign(&digest).unwrap();

        let key = VerifyingKey::from_bytes(&signer.public_key()).unwrap();
        key.verify(&digest, &Signature::from_bytes(&signature))
            .unwrap();
        assert!(
            key.verify(&[0; 32], &Signature::from_bytes(&signature))
                .is_err()
        );
    }

    #[test]
    fn debug_output_hides_secret() {
        let signer = MnemonicSigner::from_secret([7; 32]);
        let debug = format!("{signer:?}");
        assert!(debug.contains(&hex(&signer.public_key())));
        assert!(!debug.contains(&hex(&[7; 32])));
    }
}
