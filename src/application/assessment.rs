//! Assessment service: scores questionnaires and manages user history.
//!
//! This service coordinates:
//! - Submission validation
//! - Risk scoring with the shared parameter set
//! - History persistence and retrieval
//! - Trend building over a user's history

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::{compute_risk, Assessment, RiskAssessmentInput, RiskModels, RiskResult};
use crate::ports::{AssessmentPage, AssessmentStore};
use crate::HealthGuardError;

use super::trend::{build_trend, TrendPoint};

/// Service for scoring and keeping assessments.
///
/// The parameter set is immutable and shared, so one service (or clones of
/// its `Arc`s) can serve any number of threads.
pub struct AssessmentService<S>
where
    S: AssessmentStore,
{
    models: Arc<RiskModels>,
    store: Arc<S>,
}

impl<S> Clone for AssessmentService<S>
where
    S: AssessmentStore,
{
    fn clone(&self) -> Self {
        Self {
            models: Arc::clone(&self.models),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AssessmentService<S>
where
    S: AssessmentStore,
    S::Error: Into<StorageError>,
{
    /// Create a new assessment service.
    pub fn new(models: Arc<RiskModels>, store: Arc<S>) -> Self {
        Self { models, store }
    }

    #[must_use]
    pub fn models(&self) -> &RiskModels {
        &self.models
    }

    /// Score a questionnaire without storing anything.
    ///
    /// # Errors
    /// Returns `HealthGuardError::Scoring` if height or weight is unusable.
    pub fn evaluate(&self, input: &RiskAssessmentInput) -> Result<RiskResult, HealthGuardError> {
        compute_risk(input, &self.models).map_err(|e| {
            if e.is_internal() {
                tracing::error!("Scoring defect: {}", e);
            } else {
                tracing::debug!("Rejected measurements: {}", e);
            }
            HealthGuardError::Scoring(e)
        })
    }

    /// Validate, score and persist a submission.
    ///
    /// # Errors
    /// Returns `Validation` for an empty user id or missing required fields,
    /// `Scoring` for unusable measurements and `Storage` if the record could
    /// not be saved.
    pub fn submit(
        &self,
        user_id: &str,
        input: RiskAssessmentInput,
    ) -> Result<Assessment, HealthGuardError> {
        let user_id = user_key(user_id)?;

        let missing = input.missing_required_fields();
        if !missing.is_empty() {
            return Err(HealthGuardError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let result = self.evaluate(&input)?;
        let assessment = Assessment::new(user_id, input, result, self.models.fingerprint());

        self.store
            .save_assessment(&assessment)
            .map_err(|e| HealthGuardError::Storage(e.into()))?;

        tracing::info!(
            "Assessment {} scored: {} (model={})",
            assessment.id,
            assessment.result,
            self.models.fingerprint_short()
        );
        Ok(assessment)
    }

    /// A user's most recent assessments, newest first.
    ///
    /// # Errors
    /// Returns `Validation` for a blank user id, or error if storage fails.
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<Assessment>, HealthGuardError> {
        let user_id = user_key(user_id)?;
        self.store
            .load_user_assessments(user_id, limit)
            .map_err(|e| HealthGuardError::Storage(e.into()))
    }

    /// One page of a user's history, newest first.
    ///
    /// # Errors
    /// Returns `Validation` for a blank user id, or error if storage fails.
    pub fn history_page(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, HealthGuardError> {
        let user_id = user_key(user_id)?;
        self.store
            .load_user_assessments_paginated(user_id, offset, limit)
            .map_err(|e| HealthGuardError::Storage(e.into()))
    }

    /// Fetch one of the user's assessments.
    ///
    /// # Errors
    /// Returns `Storage(NotFound)` if it does not exist or belongs to
    /// someone else, `Validation` for a blank user id.
    pub fn get(&self, user_id: &str, id: &str) -> Result<Assessment, HealthGuardError> {
        let user_id = user_key(user_id)?;
        self.store
            .load_assessment(id, user_id)
            .map_err(|e| HealthGuardError::Storage(e.into()))?
            .ok_or_else(|| not_found(id))
    }

    /// Delete one of the user's assessments.
    ///
    /// # Errors
    /// Returns `Storage(NotFound)` if nothing was deleted.
    pub fn delete(&self, user_id: &str, id: &str) -> Result<(), HealthGuardError> {
        let user_id = user_key(user_id)?;
        let deleted = self
            .store
            .delete_assessment(id, user_id)
            .map_err(|e| HealthGuardError::Storage(e.into()))?;
        if !deleted {
            return Err(not_found(id));
        }
        tracing::info!("Deleted assessment {}", id);
        Ok(())
    }

    /// Remove a user's entire history (account deletion).
    ///
    /// # Errors
    /// Returns `Validation` for a blank user id, or error if storage fails.
    pub fn delete_all(&self, user_id: &str) -> Result<usize, HealthGuardError> {
        let user_id = user_key(user_id)?;
        self.store
            .delete_user_assessments(user_id)
            .map_err(|e| HealthGuardError::Storage(e.into()))
    }

    /// Number of assessments the user has.
    ///
    /// # Errors
    /// Returns `Validation` for a blank user id, or error if storage fails.
    pub fn count(&self, user_id: &str) -> Result<usize, HealthGuardError> {
        let user_id = user_key(user_id)?;
        self.store
            .count_user_assessments(user_id)
            .map_err(|e| HealthGuardError::Storage(e.into()))
    }

    /// Timeline over the user's latest `limit` assessments, oldest first.
    ///
    /// # Errors
    /// Returns `Validation` for a blank user id, or error if storage fails.
    pub fn trend(&self, user_id: &str, limit: usize) -> Result<Vec<TrendPoint>, HealthGuardError> {
        let history = self.history(user_id, limit)?;
        Ok(build_trend(&history))
    }
}

/// User ids are compared trimmed everywhere; a blank id is never valid.
fn user_key(user_id: &str) -> Result<&str, HealthGuardError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(HealthGuardError::Validation("user id is required".to_string()));
    }
    Ok(user_id)
}

fn not_found(id: &str) -> HealthGuardError {
    HealthGuardError::Storage(StorageError::NotFound(format!("assessment {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteStore;
    use crate::domain::{Gender, RiskLevel, ScoringError};

    fn create_test_service() -> AssessmentService<SqliteStore> {
        let store = Arc::new(SqliteStore::in_memory().expect("Should create db"));
        AssessmentService::new(Arc::new(RiskModels::published()), store)
    }

    fn input(weight: f64) -> RiskAssessmentInput {
        RiskAssessmentInput {
            age: Some(24.0),
            gender: Some(Gender::Male),
            height: Some(178.0),
            weight: Some(weight),
            blood_pressure: Some("122/79".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_and_get() {
        let service = create_test_service();
        let saved = service.submit("alice", input(72.0)).expect("Should submit");

        assert_eq!(saved.user_id, "alice");
        assert_eq!(saved.model_fingerprint, service.models().fingerprint());
        assert_eq!(saved.result, service.evaluate(&input(72.0)).expect("Should score"));

        let loaded = service.get("alice", &saved.id).expect("Should load");
        assert_eq!(loaded.result, saved.result);
        assert_eq!(service.count("alice").expect("Should count"), 1);
    }

    #[test]
    fn test_submit_validation() {
        let service = create_test_service();

        let err = service.submit("  ", input(72.0)).expect_err("Empty user");
        assert!(matches!(err, HealthGuardError::Validation(_)));

        let incomplete = RiskAssessmentInput {
            gender: None,
            ..input(72.0)
        };
        let err = service.submit("alice", incomplete).expect_err("Missing gender");
        assert!(matches!(err, HealthGuardError::Validation(ref m) if m.contains("gender")));

        let zeroed: RiskAssessmentInput =
            serde_json::from_str(r#"{"age": 0, "gender": "", "height": 180, "weight": 80}"#)
                .expect("Should decode");
        let err = service.submit("alice", zeroed).expect_err("Zero age and blank gender");
        assert!(matches!(
            err,
            HealthGuardError::Validation(ref m) if m.contains("age") && m.contains("gender")
        ));

        let err = service.submit("alice", input(-5.0)).expect_err("Bad weight");
        assert!(matches!(
            err,
            HealthGuardError::Scoring(ScoringError::InvalidMeasurement { field: "weight", .. })
        ));

        assert_eq!(service.count("alice").expect("Should count"), 0);
    }

    #[test]
    fn test_user_id_is_trimmed_everywhere() {
        let service = create_test_service();
        let saved = service.submit(" alice ", input(72.0)).expect("Should submit");
        assert_eq!(saved.user_id, "alice");

        assert_eq!(service.history("alice ", 10).expect("Should load").len(), 1);
        assert_eq!(service.history_page("\talice", 0, 5).expect("Should load").total_count, 1);
        assert_eq!(service.get(" alice", &saved.id).expect("Should load").id, saved.id);
        assert_eq!(service.count("alice\n").expect("Should count"), 1);
        assert_eq!(service.trend(" alice ", 10).expect("Should build").len(), 1);

        for blank in ["", "   "] {
            assert!(matches!(
                service.history(blank, 10),
                Err(HealthGuardError::Validation(_))
            ));
            assert!(matches!(
                service.delete_all(blank),
                Err(HealthGuardError::Validation(_))
            ));
        }

        service.delete(" alice ", &saved.id).expect("Should delete");
        assert_eq!(service.delete_all("alice ").expect("Should delete"), 0);
    }

    #[test]
    fn test_other_users_records_are_not_found() {
        let service = create_test_service();
        let saved = service.submit("alice", input(72.0)).expect("Should submit");

        let err = service.get("bob", &saved.id).expect_err("Not bob's");
        assert!(matches!(err, HealthGuardError::Storage(StorageError::NotFound(_))));
        let err = service.delete("bob", &saved.id).expect_err("Not bob's");
        assert!(matches!(err, HealthGuardError::Storage(StorageError::NotFound(_))));

        service.delete("alice", &saved.id).expect("Should delete");
        assert_eq!(service.count("alice").expect("Should count"), 0);
    }

    #[test]
    fn test_delete_all_only_touches_one_user() {
        let service = create_test_service();
        service.submit("alice", input(72.0)).expect("Should submit");
        service.submit("alice", input(74.0)).expect("Should submit");
        service.submit("bob", input(80.0)).expect("Should submit");

        assert_eq!(service.delete_all("alice").expect("Should delete"), 2);
        assert_eq!(service.count("alice").expect("Should count"), 0);
        assert_eq!(service.count("bob").expect("Should count"), 1);
    }

    #[test]
    fn test_history_and_trend() {
        let service = create_test_service();
        for weight in [110.0, 95.0, 80.0] {
            service.submit("alice", input(weight)).expect("Should submit");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let history = service.history("alice", 10).expect("Should load");
        assert_eq!(history.len(), 3);
        assert!(history[0].date >= history[1].date);

        let page = service.history_page("alice", 0, 2).expect("Should load");
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);

        let trend = service.trend("alice", 10).expect("Should build");
        assert_eq!(trend.len(), 3);
        assert!(trend[0].delta.is_none());
        assert_eq!(trend[0].assessment_id, history[2].id);
        assert!(trend[1..].iter().all(|p| p.delta.is_some()));
    }

    #[test]
    fn test_concurrent_scoring() {
        let service = create_test_service();
        let expected = service.evaluate(&input(90.0)).expect("Should score");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                std::thread::spawn(move || {
                    let result = service.evaluate(&input(90.0)).expect("Should score");
                    service
                        .submit(&format!("user-{i}"), input(90.0))
                        .expect("Should submit");
                    result
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("Thread panicked"), expected);
        }
        assert_eq!(service.count("user-3").expect("Should count"), 1);
        assert_ne!(expected.overall.level, RiskLevel::High);
    }
}
