use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// DAY OF WEEK
// ==============================================================================

/// Canonical form is lowercase English; Spanish names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[serde(alias = "lunes", alias = "MONDAY", alias = "LUNES")]
    Monday,
    #[serde(alias = "martes", alias = "TUESDAY", alias = "MARTES")]
    Tuesday,
    #[serde(alias = "miercoles", alias = "miércoles", alias = "WEDNESDAY", alias = "MIERCOLES")]
    Wednesday,
    #[serde(alias = "jueves", alias = "THURSDAY", alias = "JUEVES")]
    Thursday,
    #[serde(alias = "viernes", alias = "FRIDAY", alias = "VIERNES")]
    Friday,
    #[serde(alias = "sabado", alias = "sábado", alias = "SATURDAY", alias = "SABADO")]
    Saturday,
    #[serde(alias = "domingo", alias = "SUNDAY", alias = "DOMINGO")]
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = ProfessionalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day = match s.trim().to_lowercase().as_str() {
            "monday" | "lunes" => DayOfWeek::Monday,
            "tuesday" | "martes" => DayOfWeek::Tuesday,
            "wednesday" | "miercoles" | "miércoles" => DayOfWeek::Wednesday,
            "thursday" | "jueves" => DayOfWeek::Thursday,
            "friday" | "viernes" => DayOfWeek::Friday,
            "saturday" | "sabado" | "sábado" => DayOfWeek::Saturday,
            "sunday" | "domingo" => DayOfWeek::Sunday,
            other => return Err(ProfessionalError::ValidationError(format!("Unknown day of week: {}", other))),
        };
        Ok(day)
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `HH:MM` time-of-day. Also reads the `HH:MM:SS` form Postgres returns for `time` columns.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("expected HH:MM, got '{}'", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("expected HH:MM, got '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// Recurring weekly open hours for a professional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityBlock {
    pub fn new(professional_id: Uuid, day_of_week: DayOfWeek, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            professional_id,
            day_of_week,
            start_time,
            end_time,
            created_at: Utc::now(),
        }
    }

    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        (self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default, with = "hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
}

/// One day of a bulk weekly schedule. Inactive days are cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyDayEntry {
    pub day_of_week: DayOfWeek,
    #[serde(alias = "activo")]
    pub active: bool,
    #[serde(default, with = "hhmm::option", alias = "hora_inicio")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option", alias = "hora_fin")]
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleRequest {
    pub days: Vec<WeeklyDayEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub day_of_week: Option<DayOfWeek>,
}

// ==============================================================================
// PROFESSIONAL DIRECTORY MODELS
// ==============================================================================

/// Public profile. `id` is the professional's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub description: Option<String>,
    pub experience_years: Option<i32>,
    /// Consultation price in COP.
    pub consultation_price: Option<i64>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: i32,
    pub license: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertProfessionalRequest {
    pub full_name: String,
    pub specialty: String,
    pub description: Option<String>,
    pub experience_years: Option<i32>,
    pub consultation_price: Option<i64>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub photo_url: Option<String>,
    pub license: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalSearchQuery {
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub name: Option<String>,
    pub limit: Option<usize>,
}

// ==============================================================================
// FAVORITES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub professional_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FavoriteWithProfessional {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub professional: Option<Professional>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum ProfessionalError {
    #[error("Professional not found")]
    NotFound,

    #[error("Availability block not found")]
    AvailabilityNotFound,

    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Availability block belongs to another professional")]
    NotOwner,

    #[error("Professional is already in favorites")]
    FavoriteExists,

    #[error("Favorite not found")]
    FavoriteNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for ProfessionalError {
    fn from(e: anyhow::Error) -> Self {
        ProfessionalError::DatabaseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn day_of_week_accepts_spanish_and_serializes_lowercase() {
        let day: DayOfWeek = serde_json::from_str("\"miércoles\"").unwrap();
        assert_eq!(day, DayOfWeek::Wednesday);
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"wednesday\"");
        assert_eq!("LUNES".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
    }

    #[test]
    fn day_of_week_from_calendar_date() {
        // 2030-01-07 is a Monday
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        assert_eq!(DayOfWeek::from(date.weekday()), DayOfWeek::Monday);
        assert_eq!(Weekday::from(DayOfWeek::Sunday), Weekday::Sun);
    }

    #[test]
    fn availability_block_time_format() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "professional_id": Uuid::new_v4(),
            "day_of_week": "friday",
            "start_time": "08:00:00",
            "end_time": "12:30",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let block: AvailabilityBlock = serde_json::from_value(json).unwrap();
        assert_eq!(block.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let back = serde_json::to_value(&block).unwrap();
        assert_eq!(back["start_time"], "08:00");
        assert_eq!(back["end_time"], "12:30");
    }

    #[test]
    fn weekly_entry_accepts_spanish_keys() {
        let entry: WeeklyDayEntry = serde_json::from_str(
            r#"{"day_of_week":"lunes","activo":true,"hora_inicio":"09:00","hora_fin":"17:00"}"#,
        ).unwrap();
        assert!(entry.active);
        assert_eq!(entry.end_time, NaiveTime::from_hms_opt(17, 0, 0));
    }
}
