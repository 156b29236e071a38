use crate::config::AppPaths;
use crate::session::Session;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create dir {}", path.display()))
}

/// Writes through a sibling temp file so readers never see a partial file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .context("atomic_write requires a parent dir")?;
    ensure_dir(parent)?;

    let tmp = parent.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("jarrones")
    ));

    {
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("Failed to create temp file {}", tmp.display()))?;
        f.write_all(contents)
            .with_context(|| format!("Failed to write temp file {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("Failed to sync temp file {}", tmp.display()))?;
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

/// The in-progress session, kept as JSON between invocations.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(paths: &AppPaths) -> Self {
        Self {
            path: paths.data_dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let mut session: Session = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        session.ensure_jars();
        session
            .validate()
            .with_context(|| format!("Invalid session in {}", self.path.display()))?;
        Ok(Some(session))
    }

    /// Like [`SessionStore::load`] but a missing session is an error.
    pub fn require(&self) -> Result<Session> {
        self.load()?.ok_or_else(|| {
            anyhow::anyhow!(
                "No active session. Start one with: jarrones session new <income> --month <month>"
            )
        })
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        atomic_write(&self.path, json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "session written");
        Ok(())
    }

    /// Returns whether a session existed.
    pub fn reset(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Jar, Month};
    use rust_decimal_macros::dec;

    fn paths(dir: &tempfile::TempDir) -> AppPaths {
        AppPaths {
            config_dir: dir.path().join("config"),
            data_dir: dir.path().join("data"),
        }
    }

    #[test]
    fn session_survives_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(&paths(&dir));
        assert!(store.load().unwrap().is_none());
        assert!(store.require().is_err());

        let mut session = Session::new(dec!(2000), 2026, Month::Marzo).unwrap();
        session
            .add_expense(Jar::Fun, Some("Cine / Entretenimiento"), Some("15"))
            .unwrap();
        store.save(&session).unwrap();

        let loaded = store.require().unwrap();
        assert_eq!(loaded, session);
        assert!(store.reset().unwrap());
        assert!(!store.reset().unwrap());
    }

    #[test]
    fn missing_jars_are_filled_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(&paths(&dir));
        atomic_write(
            store.path(),
            br#"{"income":"100","year":2025,"month":"Mayo","updated_at":"2025-05-01T00:00:00Z"}"#,
        )
        .unwrap();
        let loaded = store.require().unwrap();
        assert_eq!(loaded.jars.len(), Jar::ALL.len());
        assert_eq!(loaded.month, Month::Mayo);
    }

    #[test]
    fn hand_edited_session_is_rechecked_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(&paths(&dir));

        atomic_write(
            store.path(),
            br#"{"income":"0","year":2025,"month":"Mayo","updated_at":"2025-05-01T00:00:00Z"}"#,
        )
        .unwrap();
        let err = store.load().unwrap_err();
        assert!(format!("{err:#}").contains("Income must be greater than zero"));

        atomic_write(
            store.path(),
            br#"{"income":"100","year":1999,"month":"Mayo","updated_at":"2025-05-01T00:00:00Z"}"#,
        )
        .unwrap();
        let err = store.require().unwrap_err();
        assert!(format!("{err:#}").contains("Year 1999 is out of range"));
    }
}
