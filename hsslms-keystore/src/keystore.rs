use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use hsslms_core::error::{Error, Result};
use hsslms_core::params::{LmotsAlgorithm, LmsAlgorithm};
use hsslms_sig::signature::hss;

use crate::codec;

/// File magic and format version; doubles as the AEAD associated data, so a
/// relabeled or downgraded file fails authentication outright.
pub const FILE_HEADER: [u8; 18] = *b"hsslms-privkey-v01";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 390_000;

fn derive_key(salt: &[u8], password: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ROUNDS, &mut key);
    key
}

fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".bak");
    PathBuf::from(os)
}

/// An HSS private key bound to an encrypted file.
///
/// Signing flushes the advanced key state to disk every `frequency`-th
/// signature *before* the signature is handed out, and [`load`] burns the
/// `frequency - 1` leaves that may have been emitted since the last flush,
/// so no leaf index can ever be signed twice across process lifetimes.
///
/// The key is a single-writer resource. In-process, `&mut self` serializes
/// all signing; across processes, exactly one process may operate on a given
/// key file.
///
/// [`load`]: PersistentPrivateKey::load
pub struct PersistentPrivateKey {
    inner: hss::PrivateKey,
    path: PathBuf,
    salt: [u8; SALT_LEN],
    key: [u8; KEY_LEN],
    frequency: u32,
    sign_count: u64,
}

impl PersistentPrivateKey {
    /// Generate a fresh key bound to `path`. Nothing is written until the
    /// first [`save`](Self::save) or flushing [`sign`](Self::sign).
    ///
    /// A `frequency` of 0 is treated as 1 (flush on every signature, the
    /// conservative default that makes skip-ahead a no-op).
    pub fn generate(
        lms_algos: &[LmsAlgorithm],
        ots_algo: LmotsAlgorithm,
        path: impl Into<PathBuf>,
        password: &[u8],
        frequency: u32,
        num_cores: Option<usize>,
    ) -> Result<Self> {
        let inner = hss::PrivateKey::generate(lms_algos, ots_algo, &mut OsRng, num_cores)?;
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let key = derive_key(&salt, password);
        Ok(Self {
            inner,
            path: path.into(),
            salt,
            key,
            frequency: frequency.max(1),
            sign_count: 0,
        })
    }

    /// Load a key from its encrypted file, then skip `frequency - 1`
    /// signatures of the empty string to cover the durability gap.
    pub fn load(path: impl Into<PathBuf>, password: &[u8]) -> Result<Self> {
        let path = path.into();
        let data = fs::read(&path)?;
        if data.len() < FILE_HEADER.len() + SALT_LEN + NONCE_LEN {
            return Err(Error::BadKeyFile("file too short"));
        }
        if data[..FILE_HEADER.len()] != FILE_HEADER {
            return Err(Error::BadKeyFile("bad magic or version"));
        }
        let salt_end = FILE_HEADER.len() + SALT_LEN;
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[FILE_HEADER.len()..salt_end]);
        let key = derive_key(&salt, password);

        let nonce = &data[salt_end..salt_end + NONCE_LEN];
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let mut plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: &data[salt_end + NONCE_LEN..],
                    aad: &FILE_HEADER,
                },
            )
            .map_err(|_| Error::WrongPassword)?;
        let decoded = codec::decode(&plaintext);
        plaintext.zeroize();
        let (inner, frequency, sign_count) = decoded?;

        let mut sk = Self {
            inner,
            path,
            salt,
            key,
            frequency,
            sign_count,
        };
        for _ in 1..sk.frequency {
            sk.sign(b"")?;
        }
        Ok(sk)
    }

    /// Sign `message`; every `frequency`-th call flushes the key state to
    /// disk before the signature is returned. A failed flush aborts the
    /// call and the signature is withheld.
    pub fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let signature = self.inner.sign(message, &mut OsRng)?;
        self.sign_count += 1;
        if self.sign_count % u64::from(self.frequency) == 0 {
            self.save()?;
        }
        Ok(signature)
    }

    /// Write the current state with atomic replacement: the previous file
    /// survives as `<path>.bak` until the new one is fully written.
    pub fn save(&self) -> Result<()> {
        let bak = backup_path(&self.path);
        match fs::rename(&self.path, &bak) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut plaintext = codec::encode(&self.inner, self.frequency, self.sign_count);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let ciphertext = cipher.encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: &plaintext,
                aad: &FILE_HEADER,
            },
        );
        plaintext.zeroize();
        let ciphertext = ciphertext
            .map_err(|_| Error::Io(std::io::Error::new(ErrorKind::Other, "encryption failed")))?;

        let mut out =
            Vec::with_capacity(FILE_HEADER.len() + SALT_LEN + NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&FILE_HEADER);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        fs::write(&self.path, &out)?;

        let _ = fs::remove_file(&bak);
        Ok(())
    }

    pub fn public_key(&self) -> hss::PublicKey {
        self.inner.public_key()
    }

    pub fn levels(&self) -> usize {
        self.inner.levels()
    }

    pub fn lms_algorithms(&self) -> &[LmsAlgorithm] {
        self.inner.lms_algorithms()
    }

    pub fn ots_algorithm(&self) -> LmotsAlgorithm {
        self.inner.ots_algorithm()
    }

    pub fn available_signatures(&self) -> u64 {
        self.inner.available_signatures()
    }

    pub fn sign_count(&self) -> u64 {
        self.sign_count
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PersistentPrivateKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
