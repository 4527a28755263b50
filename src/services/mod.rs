//! Business logic services

pub mod attendance;
pub mod clock;
pub mod holidays;
pub mod roster;

use std::sync::Arc;

use crate::repository::Repository;

pub use clock::{CancellationFlag, Clock, FixedClock, SystemClock};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub attendance: attendance::AttendanceService,
    pub roster: roster::RosterService,
    pub holidays: holidays::HolidaysService,
}

impl Services {
    /// Create all services with the given repository and clock
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            attendance: attendance::AttendanceService::new(repository.clone(), clock),
            roster: roster::RosterService::new(repository.clone()),
            holidays: holidays::HolidaysService::new(repository),
        }
    }
}
