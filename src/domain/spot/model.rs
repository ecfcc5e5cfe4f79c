//! Parking spot domain entity

use chrono::{DateTime, Utc};

/// Physical kind of spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpotType {
    #[default]
    Regular,
    Disabled,
    Electric,
}

impl SpotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Disabled => "disabled",
            Self::Electric => "electric",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(Self::Regular),
            "disabled" => Some(Self::Disabled),
            "electric" => Some(Self::Electric),
            _ => None,
        }
    }
}

/// Administrative status of a spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpotStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
            Self::Reserved => "reserved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "occupied" => Some(Self::Occupied),
            "maintenance" => Some(Self::Maintenance),
            "reserved" => Some(Self::Reserved),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parking spot
#[derive(Debug, Clone)]
pub struct ParkingSpot {
    pub id: String,
    /// Display label ("A1", "B12")
    pub number: String,
    pub location: String,
    pub is_occupied: bool,
    pub current_session_id: Option<String>,
    pub spot_type: SpotType,
    pub status: SpotStatus,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn new(
        number: impl Into<String>,
        location: impl Into<String>,
        spot_type: SpotType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            number: number.into(),
            location: location.into(),
            is_occupied: false,
            current_session_id: None,
            spot_type,
            status: SpotStatus::Available,
            last_updated: now,
            created_at: now,
        }
    }

    /// A session may be opened on this spot.
    pub fn is_available(&self) -> bool {
        !self.is_occupied && self.status == SpotStatus::Available
    }

    pub fn occupy(&mut self, session_id: &str, at: DateTime<Utc>) {
        self.is_occupied = true;
        self.current_session_id = Some(session_id.to_string());
        self.status = SpotStatus::Occupied;
        self.last_updated = at;
    }

    pub fn release(&mut self, at: DateTime<Utc>) {
        self.is_occupied = false;
        self.current_session_id = None;
        if self.status == SpotStatus::Occupied {
            self.status = SpotStatus::Available;
        }
        self.last_updated = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_spot_is_available() {
        let spot = ParkingSpot::new("A1", "Level 1", SpotType::Regular);
        assert!(spot.is_available());
        assert!(spot.current_session_id.is_none());
    }

    #[test]
    fn occupy_then_release() {
        let mut spot = ParkingSpot::new("A1", "Level 1", SpotType::Electric);
        spot.occupy("s1", Utc::now());
        assert!(spot.is_occupied);
        assert_eq!(spot.status, SpotStatus::Occupied);
        assert_eq!(spot.current_session_id.as_deref(), Some("s1"));
        assert!(!spot.is_available());

        spot.release(Utc::now());
        assert!(!spot.is_occupied);
        assert_eq!(spot.status, SpotStatus::Available);
        assert!(spot.current_session_id.is_none());
    }

    #[test]
    fn maintenance_spot_is_not_available() {
        let mut spot = ParkingSpot::new("B2", "Level 2", SpotType::Disabled);
        spot.status = SpotStatus::Maintenance;
        assert!(!spot.is_available());
    }
}
