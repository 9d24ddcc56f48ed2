use crate::client::SessionToken;
use crate::error::Result;
use std::fs;
use std::path::PathBuf;

const SESSION_FILENAME: &str = "session.json";

/// Manages session token storage on disk.
///
/// Tokens are written as pretty JSON under the data directory with
/// restrictive permissions, and reloaded on subsequent runs so the CLI does
/// not need to re-authenticate every request.
pub struct SessionStore {
    profile: String,
    base_dir: PathBuf,
}

impl SessionStore {
    /// Create a new session store for the given profile
    pub fn new(profile: Option<String>) -> Result<Self> {
        let profile = profile.unwrap_or_else(|| "default".to_string());
        let base_dir = super::data_dir()?.join(&profile);
        super::ensure_dir(&base_dir)?;

        Ok(Self { profile, base_dir })
    }

    /// Create a session store with a custom base directory (for testing)
    pub fn with_dir(profile: impl Into<String>, base_dir: PathBuf) -> Result<Self> {
        let profile = profile.into();
        let dir = base_dir.join(&profile);
        super::ensure_dir(&dir)?;

        Ok(Self {
            profile,
            base_dir: dir,
        })
    }

    /// Get the profile name
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Save the session token to storage
    pub fn save(&self, token: &SessionToken) -> Result<()> {
        let path = self.base_dir.join(SESSION_FILENAME);
        let json = serde_json::to_string_pretty(token)?;
        fs::write(&path, json)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Load the session token from storage
    pub fn load(&self) -> Result<Option<SessionToken>> {
        let path = self.base_dir.join(SESSION_FILENAME);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        let token: SessionToken = serde_json::from_str(&json)?;
        Ok(Some(token))
    }

    /// Check if a session exists on disk
    pub fn has_session(&self) -> bool {
        self.base_dir.join(SESSION_FILENAME).exists()
    }

    /// Clear the stored session
    pub fn clear(&self) -> Result<()> {
        let path = self.base_dir.join(SESSION_FILENAME);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
