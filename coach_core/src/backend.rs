//! Backend collaborator contracts and a file-backed implementation.
//!
//! The coaching backend owns workouts, completions and user profiles. The
//! player only needs three calls from it, captured by [`WorkoutBackend`].
//! [`LocalBackend`] serves them from a data directory:
//!
//! ```text
//! <data_dir>/
//!   access_token                 optional; when present, credentials must match
//!   programs/<program>/day_<n>.json
//!   completions.wal              JSONL completion log
//!   completions.csv              completions archived by rollup
//!   profile.json                 cached profile, rebuilt on refresh
//! ```

use crate::completion_log::{CompletionSink, JsonlCompletionLog};
use crate::{CompletionRecord, Error, ProgramDay, Result, UserProfile, WorkoutDefinition};
use std::path::{Path, PathBuf};

/// Credential presented with every backend call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credential {
    token: Option<String>,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// What the playback engine needs from the coaching backend
pub trait WorkoutBackend {
    /// Fetch the workout for one program day.
    ///
    /// Fails with `Unauthorized`, `NotFound` or `Network`.
    fn fetch_workout(&self, key: &ProgramDay, credential: &Credential)
        -> Result<WorkoutDefinition>;

    /// Record that a program day was completed
    fn report_completion(&mut self, key: &ProgramDay, credential: &Credential) -> Result<()>;

    /// Re-fetch the user's completed and unlocked days
    fn refresh_profile(&mut self, credential: &Credential) -> Result<UserProfile>;
}

pub const ACCESS_TOKEN_FILE: &str = "access_token";
pub const COMPLETION_LOG_FILE: &str = "completions.wal";
pub const COMPLETION_HISTORY_FILE: &str = "completions.csv";
pub const PROFILE_FILE: &str = "profile.json";

/// Backend stand-in that serves a data directory
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a day's workout. Program names that would leave
    /// `programs/` are rejected as not found.
    pub fn workout_path(&self, key: &ProgramDay) -> Result<PathBuf> {
        if !is_plain_name(&key.program_name) {
            tracing::warn!("Rejecting program name {:?}", key.program_name);
            return Err(Error::NotFound(key.to_string()));
        }

        Ok(self
            .root
            .join("programs")
            .join(&key.program_name)
            .join(format!("day_{}.json", key.day_number)))
    }

    pub fn completion_log_path(&self) -> PathBuf {
        self.root.join(COMPLETION_LOG_FILE)
    }

    /// CSV archive written by `rollup`
    pub fn completion_history_path(&self) -> PathBuf {
        self.root.join(COMPLETION_HISTORY_FILE)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.root.join(PROFILE_FILE)
    }

    /// Last profile written by `refresh_profile`, if any
    pub fn cached_profile(&self) -> Result<Option<UserProfile>> {
        crate::storage::read_json(&self.profile_path())
    }

    fn authorize(&self, credential: &Credential) -> Result<()> {
        let token_path = self.root.join(ACCESS_TOKEN_FILE);
        if !token_path.exists() {
            return Ok(());
        }

        let expected = std::fs::read_to_string(&token_path)
            .map_err(|e| Error::Network(format!("cannot read access token: {}", e)))?;
        match credential.token() {
            Some(token) if token == expected.trim() => Ok(()),
            _ => Err(Error::Unauthorized),
        }
    }
}

/// A single path component: no separators, no `..`, not empty
fn is_plain_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(|c: char| c == '/' || c == '\\')
}

impl WorkoutBackend for LocalBackend {
    fn fetch_workout(
        &self,
        key: &ProgramDay,
        credential: &Credential,
    ) -> Result<WorkoutDefinition> {
        self.authorize(credential)?;

        let path = self.workout_path(key)?;
        if !path.exists() {
            return Err(Error::NotFound(key.to_string()));
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Network(format!("failed to read {:?}: {}", path, e)))?;
        let workout: WorkoutDefinition = serde_json::from_str(&contents)
            .map_err(|e| Error::Network(format!("malformed workout {:?}: {}", path, e)))?;

        tracing::info!(
            "Fetched '{}' for {} ({} blocks)",
            workout.title,
            key,
            workout.blocks.len()
        );
        Ok(workout)
    }

    fn report_completion(&mut self, key: &ProgramDay, credential: &Credential) -> Result<()> {
        self.authorize(credential)?;

        let mut log = JsonlCompletionLog::new(self.completion_log_path());
        log.append(&CompletionRecord::now(key))?;
        tracing::info!("Recorded completion of {}", key);
        Ok(())
    }

    fn refresh_profile(&mut self, credential: &Credential) -> Result<UserProfile> {
        self.authorize(credential)?;

        let records = crate::history::load_completion_history(
            &self.completion_log_path(),
            &self.completion_history_path(),
        )?;
        let profile = UserProfile::from_completions(&records);
        crate::storage::write_json_atomic(&self.profile_path(), &profile)?;
        tracing::debug!("Refreshed profile from {} completions", records.len());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::tests::two_by_two;

    fn backend_with_workout(key: &ProgramDay) -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(temp_dir.path());
        let path = backend.workout_path(key).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_string(&two_by_two()).unwrap()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_fetch_workout() {
        let key = ProgramDay::new("beginner-program", 1);
        let (_dir, backend) = backend_with_workout(&key);

        let workout = backend.fetch_workout(&key, &Credential::anonymous()).unwrap();
        assert_eq!(workout, two_by_two());
    }

    #[test]
    fn test_fetch_missing_day_is_not_found() {
        let key = ProgramDay::new("beginner-program", 1);
        let (_dir, backend) = backend_with_workout(&key);

        let result = backend.fetch_workout(&ProgramDay::new("beginner-program", 2), &Credential::anonymous());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_fetch_malformed_is_network_error() {
        let key = ProgramDay::new("beginner-program", 1);
        let (_dir, backend) = backend_with_workout(&key);
        std::fs::write(backend.workout_path(&key).unwrap(), "<html>502</html>").unwrap();

        let result = backend.fetch_workout(&key, &Credential::anonymous());
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[test]
    fn test_access_token_enforced() {
        let key = ProgramDay::new("beginner-program", 1);
        let (dir, backend) = backend_with_workout(&key);
        std::fs::write(dir.path().join(ACCESS_TOKEN_FILE), "s3cret\n").unwrap();

        assert!(matches!(
            backend.fetch_workout(&key, &Credential::anonymous()),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            backend.fetch_workout(&key, &Credential::bearer("wrong")),
            Err(Error::Unauthorized)
        ));
        assert!(backend
            .fetch_workout(&key, &Credential::bearer("s3cret"))
            .is_ok());
    }

    #[test]
    fn test_report_then_refresh_profile() {
        let key = ProgramDay::new("beginner-program", 1);
        let (_dir, mut backend) = backend_with_workout(&key);
        let credential = Credential::anonymous();

        backend.report_completion(&key, &credential).unwrap();
        let profile = backend.refresh_profile(&credential).unwrap();

        assert!(profile.is_completed(&key));
        assert_eq!(backend.cached_profile().unwrap(), Some(profile));
    }

    #[test]
    fn test_profile_keeps_days_archived_by_rollup() {
        let day_one = ProgramDay::new("beginner-program", 1);
        let day_two = ProgramDay::new("beginner-program", 2);
        let (_dir, mut backend) = backend_with_workout(&day_one);
        let credential = Credential::anonymous();

        backend.report_completion(&day_one, &credential).unwrap();
        assert!(backend.refresh_profile(&credential).unwrap().is_completed(&day_one));

        let rolled = crate::rollup::log_to_csv_and_archive(
            &backend.completion_log_path(),
            &backend.completion_history_path(),
        )
        .unwrap();
        assert_eq!(rolled, 1);

        backend.report_completion(&day_two, &credential).unwrap();
        let profile = backend.refresh_profile(&credential).unwrap();

        assert!(profile.is_completed(&day_one));
        assert!(profile.is_completed(&day_two));
        let standing = &profile.programs["beginner-program"];
        assert_eq!(standing.unlocked_days.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_program_names_cannot_leave_programs_dir() {
        let key = ProgramDay::new("beginner-program", 1);
        let (_dir, backend) = backend_with_workout(&key);

        for name in ["../../x", "a/b", "a\\b", "..", ".", ""] {
            let escaping = ProgramDay::new(name, 1);
            assert!(matches!(
                backend.workout_path(&escaping),
                Err(Error::NotFound(_))
            ));
            assert!(matches!(
                backend.fetch_workout(&escaping, &Credential::anonymous()),
                Err(Error::NotFound(_))
            ));
        }
        assert!(backend.workout_path(&key).is_ok());
    }
}
