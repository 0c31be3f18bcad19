//! On-disk credential storage for connected YouTube accounts.
//!
//! Two small state files back the whole gateway: a JSON list of per-account
//! credential records, and a single-scalar pointer naming the account used
//! for outgoing API calls. Both are written with a temp-file-then-rename
//! discipline so a crash mid-write can never leave a truncated file behind.

use crate::error::{Error, Result};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Access tokens are treated as expired this many seconds early, so a token
/// that would lapse mid-request is refreshed up front instead.
const EXPIRY_SAFETY_MARGIN_SECS: i64 = 300;

/// Credentials and identity for one connected account.
///
/// `refresh_token` is captured at first authorization and survives every
/// subsequent refresh and re-authorization, even when the provider omits it
/// from later token responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Channel id of the account; unique key within the store.
    pub user_id: String,
    /// Channel custom URL when set, otherwise the channel title.
    pub user_name: String,
    pub channel_title: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Lifetime of `access_token` in seconds, from the token response.
    pub expires_in: i64,
    pub scopes: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CredentialRecord {
    /// When the access token stops being usable, safety margin included.
    pub fn expires_at(&self) -> Timestamp {
        let usable = (self.expires_in - EXPIRY_SAFETY_MARGIN_SECS).max(0);
        self.updated_at
            .saturating_add(SignedDuration::from_secs(usable))
            .expect("SignedDuration arithmetic cannot contain calendar units")
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

/// Handle over the two state files. Cheap to clone; every operation reads
/// the file fresh and writes it back whole, so there is no in-memory state
/// to go stale.
#[derive(Debug, Clone)]
pub struct TokenStore {
    tokens_path: PathBuf,
    active_path: PathBuf,
}

impl TokenStore {
    pub fn new(tokens_path: impl Into<PathBuf>, active_path: impl Into<PathBuf>) -> Self {
        Self {
            tokens_path: tokens_path.into(),
            active_path: active_path.into(),
        }
    }

    /// Loads every stored record, in file order.
    ///
    /// A missing file is the empty store. An unreadable or unparsable file
    /// is an error; callers at startup should treat it as fatal rather than
    /// silently starting over with no accounts.
    pub fn load(&self) -> Result<Vec<CredentialRecord>> {
        if !self.tokens_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.tokens_path)
            .map_err(|e| Error::Store(format!("{}: {e}", self.tokens_path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Store(format!("{}: {e}", self.tokens_path.display())))
    }

    /// Replaces the whole store atomically.
    pub fn save(&self, records: &[CredentialRecord]) -> Result<()> {
        let body = serde_json::to_string_pretty(records)?;
        write_replace(&self.tokens_path, body.as_bytes())
    }

    /// Inserts or updates `record`, keyed by `user_id`, and persists.
    ///
    /// Existing records keep their position in the list; new accounts are
    /// appended. On update, `created_at` is carried over from the existing
    /// record, and a missing `refresh_token` on the incoming record is
    /// backfilled from the stored one. `updated_at` is stamped here.
    pub fn upsert(&self, mut record: CredentialRecord) -> Result<CredentialRecord> {
        let mut records = self.load()?;
        record.updated_at = Timestamp::now();
        match records.iter_mut().find(|r| r.user_id == record.user_id) {
            Some(existing) => {
                record.created_at = existing.created_at;
                if record.refresh_token.is_none() {
                    record.refresh_token = existing.refresh_token.clone();
                }
                *existing = record.clone();
            }
            None => {
                record.created_at = record.updated_at;
                records.push(record.clone());
            }
        }
        self.save(&records)?;
        Ok(record)
    }

    pub fn find(&self, user_id: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.load()?.into_iter().find(|r| r.user_id == user_id))
    }

    /// Reads the active-account pointer. Missing or empty means unset.
    pub fn active_account(&self) -> Result<Option<String>> {
        if !self.active_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.active_path)
            .map_err(|e| Error::Store(format!("{}: {e}", self.active_path.display())))?;
        let trimmed = raw.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    /// Points the active account at `user_id`.
    ///
    /// Fails with [`Error::UnknownAccount`] when the id is not in the store;
    /// the previous pointer is left untouched in that case. Setting the
    /// already-active account is a no-op rewrite.
    pub fn set_active(&self, user_id: &str) -> Result<()> {
        if self.find(user_id)?.is_none() {
            return Err(Error::UnknownAccount(user_id.to_string()));
        }
        write_replace(&self.active_path, user_id.trim().as_bytes())
    }

    /// Resolves the record outgoing API calls should authenticate as.
    ///
    /// Order of precedence: explicit override (`YOUTUBE_ACCOUNT_ID`), the
    /// pointer file, then the most recently appended record. An override or
    /// pointer naming an id that is no longer stored is an error rather
    /// than a silent fallback.
    pub fn resolve_active(&self, override_id: Option<&str>) -> Result<CredentialRecord> {
        let records = self.load()?;
        if records.is_empty() {
            return Err(Error::UnknownAccount(
                "no accounts stored; complete the authorization flow first".into(),
            ));
        }
        let chosen = match override_id {
            Some(id) => Some(id.to_string()),
            None => self.active_account()?,
        };
        match chosen {
            Some(id) => records
                .into_iter()
                .find(|r| r.user_id == id)
                .ok_or(Error::UnknownAccount(id)),
            None => Ok(records.into_iter().next_back().expect("records non-empty")),
        }
    }
}

/// Write-temp-then-rename so readers and crash recovery only ever see a
/// complete file. Permissions are tightened to owner-only where supported.
fn write_replace(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}
