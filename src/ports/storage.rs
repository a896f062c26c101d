//! Storage port: Trait for assessment history persistence.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use crate::domain::Assessment;

/// A page of assessments with pagination metadata.
#[derive(Debug, Clone)]
pub struct AssessmentPage {
    /// Assessments in this page, newest first
    pub items: Vec<Assessment>,
    /// Total count of the user's assessments
    pub total_count: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl AssessmentPage {
    /// Create a new assessment page.
    #[must_use]
    pub fn new(items: Vec<Assessment>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        self.has_more.then_some(self.offset + self.limit)
    }

    /// Get the previous page offset.
    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }
}

/// Persistent store of per-user assessment history.
///
/// Every read and delete is scoped to a user id; a record belonging to
/// another user behaves exactly like a missing one.
pub trait AssessmentStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save an assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_assessment(&self, assessment: &Assessment) -> Result<(), Self::Error>;

    /// Load a user's most recent assessments (up to `limit`), newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_user_assessments(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Assessment>, Self::Error>;

    /// Load a user's assessments with pagination, newest first.
    ///
    /// # Arguments
    /// * `offset` - Starting position (0-indexed)
    /// * `limit` - Maximum number of items to return
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_user_assessments_paginated(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, Self::Error>;

    /// Load one assessment.
    ///
    /// # Returns
    /// `None` if no such record exists or it belongs to another user.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_assessment(&self, id: &str, user_id: &str) -> Result<Option<Assessment>, Self::Error>;

    /// Count a user's assessments.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_user_assessments(&self, user_id: &str) -> Result<usize, Self::Error>;

    /// Delete one of a user's assessments.
    ///
    /// # Returns
    /// Whether a record was deleted.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_assessment(&self, id: &str, user_id: &str) -> Result<bool, Self::Error>;

    /// Delete every assessment a user owns (account deletion).
    ///
    /// # Returns
    /// Number of records deleted.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_user_assessments(&self, user_id: &str) -> Result<usize, Self::Error>;

    /// Count all stored assessments.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_assessments(&self) -> Result<usize, Self::Error>;
}
