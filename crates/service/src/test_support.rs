#![cfg(test)]
use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::remote::ReservationClient;

/// In-process stand-in for the reservations service.
#[derive(Default)]
pub struct StubReservations {
    rooms: BTreeSet<i64>,
    guests: BTreeSet<i64>,
    down: bool,
}

impl StubReservations {
    pub fn with_rooms(ids: &[i64]) -> Self {
        Self { rooms: ids.iter().copied().collect(), ..Self::default() }
    }

    pub fn with_guests(ids: &[i64]) -> Self {
        Self { guests: ids.iter().copied().collect(), ..Self::default() }
    }

    pub fn unavailable() -> Self {
        Self { down: true, ..Self::default() }
    }

    fn answer(&self, set: &BTreeSet<i64>, id: i64) -> Result<bool, ServiceError> {
        if self.down {
            return Err(ServiceError::unavailable(configs::RESERVATIONS_SERVICE, "connection refused"));
        }
        Ok(set.contains(&id))
    }
}

#[async_trait]
impl ReservationClient for StubReservations {
    async fn room_is_present(&self, id: i64) -> Result<bool, ServiceError> {
        self.answer(&self.rooms, id)
    }

    async fn guest_is_present(&self, id: i64) -> Result<bool, ServiceError> {
        self.answer(&self.guests, id)
    }
}
