//! Completion reporting: tell the backend a day is done, exactly once per session.
//!
//! Failures are logged and swallowed. The local session already shows the
//! completion screen and has cleared its progress slot, so the backend record
//! is allowed to lag behind.

use crate::backend::{Credential, WorkoutBackend};
use crate::ProgramDay;

/// What a call to [`CompletionReporter::report`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Completion recorded and profile refreshed
    Reported,
    /// Completion recorded but the profile refresh failed
    ReportedStaleProfile,
    /// The backend rejected or never received the report
    Failed,
    /// This session already reported; nothing was sent
    AlreadyReported,
}

/// One-shot completion notifier for a single workout session
#[derive(Debug, Default)]
pub struct CompletionReporter {
    fired: bool,
}

impl CompletionReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Notify the backend of completion. Only the first call does anything.
    pub fn report<B: WorkoutBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        key: &ProgramDay,
        credential: &Credential,
    ) -> ReportOutcome {
        if self.fired {
            tracing::debug!("Completion for {} already reported", key);
            return ReportOutcome::AlreadyReported;
        }
        self.fired = true;

        if let Err(e) = backend.report_completion(key, credential) {
            tracing::error!("Failed to report completion of {}: {}", key, e);
            return ReportOutcome::Failed;
        }

        match backend.refresh_profile(credential) {
            Ok(_) => ReportOutcome::Reported,
            Err(e) => {
                tracing::error!("Completion of {} recorded but profile refresh failed: {}", key, e);
                ReportOutcome::ReportedStaleProfile
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Error, Result, UserProfile, WorkoutDefinition};

    /// Backend double that counts calls and can be told to fail
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub reports: Vec<ProgramDay>,
        pub refreshes: usize,
        pub fail_reports: bool,
    }

    impl WorkoutBackend for RecordingBackend {
        fn fetch_workout(&self, key: &ProgramDay, _: &Credential) -> Result<WorkoutDefinition> {
            Err(Error::NotFound(key.to_string()))
        }

        fn report_completion(&mut self, key: &ProgramDay, _: &Credential) -> Result<()> {
            if self.fail_reports {
                return Err(Error::Network("connection reset".into()));
            }
            self.reports.push(key.clone());
            Ok(())
        }

        fn refresh_profile(&mut self, _: &Credential) -> Result<UserProfile> {
            self.refreshes += 1;
            Ok(UserProfile::default())
        }
    }

    #[test]
    fn test_reports_once() {
        let mut backend = RecordingBackend::default();
        let mut reporter = CompletionReporter::new();
        let key = ProgramDay::new("beginner-program", 5);

        assert_eq!(
            reporter.report(&mut backend, &key, &Credential::anonymous()),
            ReportOutcome::Reported
        );
        assert_eq!(
            reporter.report(&mut backend, &key, &Credential::anonymous()),
            ReportOutcome::AlreadyReported
        );
        assert_eq!(backend.reports, vec![key]);
        assert_eq!(backend.refreshes, 1);
    }

    #[test]
    fn test_failure_is_swallowed_and_not_retried() {
        let mut backend = RecordingBackend {
            fail_reports: true,
            ..Default::default()
        };
        let mut reporter = CompletionReporter::new();
        let key = ProgramDay::new("beginner-program", 5);

        assert_eq!(
            reporter.report(&mut backend, &key, &Credential::anonymous()),
            ReportOutcome::Failed
        );
        assert!(reporter.has_fired());
        assert_eq!(backend.refreshes, 0);

        backend.fail_reports = false;
        assert_eq!(
            reporter.report(&mut backend, &key, &Credential::anonymous()),
            ReportOutcome::AlreadyReported
        );
        assert!(backend.reports.is_empty());
    }
}
