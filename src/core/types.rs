//! core::types
//!
//! Validated newtypes shared by the git layer, the classifier and the operations.
//!
//! # Types
//!
//! - [`BranchName`] - branch that is safe to hand to git as an argument
//! - [`Oid`] - lowercase hex commit id
//! - [`RefName`] - full ref under `refs/`
//! - [`RemoteRole`] - Which of the two mirrors a remote plays
//! - [`Fingerprint`] - Stable digest over a snapshot's classification tuples
//!
//! # Validation
//!
//! Constructors reject anything git would refuse, and anything that could be
//! parsed as an option on a git command line.
//!
//! # Examples
//!
//! ```
//! use syncdoctor::core::types::{BranchName, Oid, RefName, RemoteRole};
//!
//! let branch = BranchName::new("main").unwrap();
//! let tip = Oid::new("0123456789ABCDEF0123456789abcdef01234567").unwrap();
//! assert_eq!(tip.as_str(), "0123456789abcdef0123456789abcdef01234567");
//! let target = RefName::for_remote_branch("origin", &branch).unwrap();
//! assert_eq!(target.as_str(), "refs/remotes/origin/main");
//! assert_eq!(RemoteRole::Hub.other(), RemoteRole::Core);
//!
//! assert!(BranchName::new("two..dots").is_err());
//! assert!(Oid::new("HEAD").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Characters git refuses anywhere in a ref name.
const INVALID_REF_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Shared `git check-ref-format` rules for branch and ref names.
fn check_ref_rules(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name == "@" {
        return Err("name cannot be '@' (reserved)".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("name cannot start or end with '/'".into());
    }
    if name.ends_with('.') {
        return Err("name cannot end with '.'".into());
    }
    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Err(format!("name cannot contain '{bad}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| INVALID_REF_CHARS.contains(c)) {
        return Err(format!("name cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("name cannot contain control characters".into());
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }
    Ok(())
}

/// Name of a local branch, checked against git's refname rules.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`).
/// A branch name additionally cannot start with `-`, so it can never be
/// mistaken for an option when passed to a git subcommand.
///
/// # Example
///
/// ```
/// use syncdoctor::core::types::BranchName;
///
/// let name = BranchName::new("release/2.x").unwrap();
/// assert_eq!(name.as_str(), "release/2.x");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-rf").is_err());
/// assert!(BranchName::new("main.lock").is_err());
/// assert!(BranchName::new("with space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Validate and wrap `name`.
    ///
    /// # Errors
    ///
    /// `TypeError::InvalidBranchName` naming the rule that was broken.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        check_ref_rules(&name).map_err(TypeError::InvalidBranchName)?;
        Ok(Self(name))
    }

    /// `main`, the branch assumed when nothing else names one.
    pub fn fallback() -> Self {
        Self("main".to_string())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A full commit id, 40 (SHA-1) or 64 (SHA-256) hex digits, stored lowercase.
///
/// # Example
///
/// ```
/// use syncdoctor::core::types::Oid;
///
/// let oid = Oid::new("FEEDFACE00000000000000000000000000000001\n").unwrap();
/// assert_eq!(oid.as_str(), "feedface00000000000000000000000000000001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Parse git output into an id, trimming whitespace.
    ///
    /// # Errors
    ///
    /// `TypeError::InvalidOid` on a wrong length or a non-hex character.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().trim().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A full ref name such as `refs/heads/main`.
///
/// # Example
///
/// ```
/// use syncdoctor::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("feature/foo").unwrap();
/// assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/feature/foo");
/// assert_eq!(
///     RefName::for_remote_branch("hub", &branch).unwrap().as_str(),
///     "refs/remotes/hub/feature/foo"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Validate and wrap `name`, which must live under `refs/`.
    ///
    /// # Errors
    ///
    /// `TypeError::InvalidRefName` when a rule is broken.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_rules(&name).map_err(TypeError::InvalidRefName)?;
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "'{name}' is not under refs/"
            )));
        }
        Ok(Self(name))
    }

    /// Create a ref name for a local branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// Create a remote-tracking ref name (`refs/remotes/<remote>/<branch>`).
    ///
    /// # Errors
    ///
    /// Fails if the remote name is not a valid ref component.
    pub fn for_remote_branch(remote: &str, branch: &BranchName) -> Result<Self, TypeError> {
        Self::new(format!("refs/remotes/{}/{}", remote, branch.as_str()))
    }

    /// The remainder after `prefix`, if the ref starts with it.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a remote plays in the mirror triangle.
///
/// The concrete git remote name for each role comes from configuration
/// (`remotes.core` / `remotes.hub`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteRole {
    /// The primary, typically self-hosted, remote.
    Core,
    /// The secondary, typically hosted, remote.
    Hub,
}

impl RemoteRole {
    /// Both roles, core first.
    pub const ALL: [RemoteRole; 2] = [RemoteRole::Core, RemoteRole::Hub];

    /// The opposite role.
    pub fn other(self) -> RemoteRole {
        match self {
            RemoteRole::Core => RemoteRole::Hub,
            RemoteRole::Hub => RemoteRole::Core,
        }
    }

    /// Stable lowercase label, also used as the retry-store key.
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteRole::Core => "core",
            RemoteRole::Hub => "hub",
        }
    }
}

impl std::fmt::Display for RemoteRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable digest over a snapshot's observed tuples.
///
/// Two detections of an unchanged repository produce the same fingerprint,
/// independent of when they ran.
///
/// # Example
///
/// ```
/// use syncdoctor::core::types::Fingerprint;
///
/// let a = Fingerprint::compute(&["E1", "W1", "S1"]);
/// let b = Fingerprint::compute(&["E1", "W1", "S1"]);
/// assert_eq!(a, b);
/// assert_ne!(a, Fingerprint::compute(&["E1", "W2", "S1"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from ordered parts.
    pub fn compute<S: AsRef<str>>(parts: &[S]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_ref().as_bytes());
            hasher.update([0u8]);
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}
