//! AvailabilityRepository port - read access to mentor availability.
//!
//! The booking read API and slot generator consume this; writes happen in
//! the profile CRUD surface outside this subsystem.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::scheduling::{AvailabilityWindow, BookedInterval};

/// Port for reading a mentor's recurring availability and exclusions.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Recurring weekly windows for a mentor.
    async fn windows_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<AvailabilityWindow>, DomainError>;

    /// Dates (mentor's zone) the mentor has explicitly blocked.
    async fn blocked_dates_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<NaiveDate>, DomainError>;

    /// Concrete booked intervals for a mentor, derived from calls and group
    /// sessions that still occupy the calendar.
    async fn booked_intervals_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<BookedInterval>, DomainError>;
}
