//! Secret provisioning.
//!
//! Creates the secret store directory and one file of random material per
//! [`SecretName`]. All material is drawn before the first file is written,
//! so a failing random source never leaves a partial store behind.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use rand::RngCore;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::bootstrap::Outcome;
use crate::core::config::ExistingPolicy;
use crate::core::constants::SECRET_LEN;
use crate::error::SecretError;

/// A secret record consumed by the deployed services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecretName {
    /// Signs auth tokens.
    AuthTokenKey,
    /// Signs auth cookies.
    AuthCookieKey,
}

impl SecretName {
    pub const ALL: [SecretName; 2] = [SecretName::AuthTokenKey, SecretName::AuthCookieKey];

    /// File name inside the secret store.
    pub fn file_name(self) -> &'static str {
        match self {
            SecretName::AuthTokenKey => "auth_token_key",
            SecretName::AuthCookieKey => "auth_cookie_key",
        }
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Secret bytes, wiped on drop.
#[derive(Clone)]
pub struct SecretMaterial(Zeroizing<[u8; SECRET_LEN]>);

impl SecretMaterial {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial(..)")
    }
}

/// Operating system CSPRNG exposed as a reader.
pub struct OsEntropy;

impl Read for OsEntropy {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        rand::rngs::OsRng
            .try_fill_bytes(buf)
            .map_err(io::Error::other)?;
        Ok(buf.len())
    }
}

/// Draw exactly [`SECRET_LEN`] bytes for `name`.
///
/// Zero bytes are valid material.
///
/// # Errors
///
/// Returns `SecretError::ShortRead` if the source ends early, or
/// `SecretError::Entropy` if it fails.
pub fn draw<R: Read + ?Sized>(name: SecretName, source: &mut R) -> Result<SecretMaterial, SecretError> {
    let mut buf = Zeroizing::new([0u8; SECRET_LEN]);
    let mut filled = 0;

    while filled < SECRET_LEN {
        match source.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(SecretError::ShortRead {
                    name,
                    got: filled,
                    expected: SECRET_LEN,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(SecretError::Entropy { name, source }),
        }
    }

    Ok(SecretMaterial(buf))
}

/// Creates the secret store.
pub struct Provisioner<R = OsEntropy> {
    dir: PathBuf,
    policy: ExistingPolicy,
    entropy: R,
}

impl Provisioner<OsEntropy> {
    /// Provisioner drawing from the operating system CSPRNG.
    pub fn new(dir: impl Into<PathBuf>, policy: ExistingPolicy) -> Self {
        Self::with_entropy(dir, policy, OsEntropy)
    }
}

impl<R: Read> Provisioner<R> {
    /// Provisioner drawing from `entropy`.
    pub fn with_entropy(dir: impl Into<PathBuf>, policy: ExistingPolicy, entropy: R) -> Self {
        Self {
            dir: dir.into(),
            policy,
            entropy,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the store directory and every secret file.
    ///
    /// Under [`ExistingPolicy::Keep`] existing files of the right length are
    /// left untouched; under [`ExistingPolicy::Overwrite`] every secret is
    /// regenerated.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Corrupt` under Keep if an existing file is not
    /// exactly [`SECRET_LEN`] bytes. Returns other `SecretError`s if the
    /// directory or a file cannot be created, or if the random source cannot
    /// supply full material. Nothing is written unless every check passes.
    pub fn provision(&mut self) -> Result<Vec<(SecretName, Outcome)>, SecretError> {
        ensure_dir(&self.dir)?;

        let mut report = Vec::with_capacity(SecretName::ALL.len());
        let mut planned = Vec::with_capacity(SecretName::ALL.len());

        for name in SecretName::ALL {
            let path = self.dir.join(name.file_name());
            if self.policy == ExistingPolicy::Keep {
                if let Some(len) = existing_len(&path)? {
                    if len != SECRET_LEN as u64 {
                        return Err(SecretError::Corrupt {
                            name,
                            len,
                            expected: SECRET_LEN,
                        });
                    }
                    info!(secret = %name, "secret exists, keeping");
                    report.push((name, Outcome::Kept));
                    continue;
                }
            }
            planned.push((name, path, draw(name, &mut self.entropy)?));
        }

        for (name, path, material) in planned {
            write_secret(&path, &material, self.policy)?;
            debug!(secret = %name, path = %path.display(), "secret written");
            report.push((name, Outcome::Written));
        }

        report.sort_by_key(|(name, _)| *name);
        Ok(report)
    }
}

fn ensure_dir(dir: &Path) -> Result<(), SecretError> {
    if dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|source| SecretError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(|source| {
            SecretError::CreateDir {
                path: dir.to_path_buf(),
                source,
            }
        })?;
    }

    debug!(path = %dir.display(), "secret store created");
    Ok(())
}

fn existing_len(path: &Path) -> Result<Option<u64>, SecretError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SecretError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write one secret file through a temp file in the same directory.
///
/// The target only ever appears with its full content.
fn write_secret(path: &Path, material: &SecretMaterial, policy: ExistingPolicy) -> Result<(), SecretError> {
    let write_err = |source| SecretError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    // NamedTempFile is created 0600.
    let mut temp = tempfile::Builder::new()
        .prefix(".secret")
        .tempfile_in(dir)
        .map_err(write_err)?;
    temp.write_all(material.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    match policy {
        // Never clobber a file that appeared after the existence check.
        ExistingPolicy::Keep => temp.persist_noclobber(path),
        ExistingPolicy::Overwrite => temp.persist(path),
    }
    .map_err(|e| write_err(e.error))?;
    Ok(())
}

/// State of one secret file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretState {
    Present,
    Missing,
    InvalidLength(u64),
}

/// Inspect every secret file without reading its content into memory.
pub fn inspect(dir: &Path) -> Vec<(SecretName, SecretState)> {
    SecretName::ALL
        .into_iter()
        .map(|name| {
            let state = match fs::metadata(dir.join(name.file_name())) {
                Ok(meta) if meta.len() == SECRET_LEN as u64 => SecretState::Present,
                Ok(meta) => SecretState::InvalidLength(meta.len()),
                Err(_) => SecretState::Missing,
            };
            (name, state)
        })
        .collect()
}

/// Secrets loaded back from a provisioned store.
pub struct SecretStore {
    secrets: BTreeMap<SecretName, SecretMaterial>,
}

impl SecretStore {
    /// Load and validate every declared secret under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Missing` for an absent file and
    /// `SecretError::InvalidLength` for a file that is not exactly
    /// [`SECRET_LEN`] bytes.
    pub fn load(dir: &Path) -> Result<Self, SecretError> {
        let mut secrets = BTreeMap::new();

        for name in SecretName::ALL {
            let path = dir.join(name.file_name());
            let bytes = match fs::read(&path) {
                Ok(bytes) => Zeroizing::new(bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(SecretError::Missing { name })
                }
                Err(source) => return Err(SecretError::Read { path, source }),
            };

            if bytes.len() != SECRET_LEN {
                return Err(SecretError::InvalidLength {
                    name,
                    len: bytes.len(),
                    expected: SECRET_LEN,
                });
            }

            let mut buf = Zeroizing::new([0u8; SECRET_LEN]);
            buf.copy_from_slice(&bytes);
            secrets.insert(name, SecretMaterial(buf));
        }

        debug!(path = %dir.display(), count = secrets.len(), "secret store loaded");
        Ok(Self { secrets })
    }

    pub fn get(&self, name: SecretName) -> Option<&SecretMaterial> {
        self.secrets.get(&name)
    }
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}
