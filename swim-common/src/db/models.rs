//! Database models
//!
//! Ids are stored as UUID text and timestamps as RFC 3339 text. Each model
//! knows how to build itself from a `SqliteRow` so the query modules stay
//! free of column parsing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Coach,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coach => "COACH",
            Role::Parent => "PARENT",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "COACH" => Ok(Role::Coach),
            "PARENT" => Ok(Role::Parent),
            other => Err(Error::CorruptRecord(format!("Unknown role: {}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Reviewed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Reviewed => "REVIEWED",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(SubmissionStatus::Pending),
            "REVIEWED" => Ok(SubmissionStatus::Reviewed),
            other => Err(Error::InvalidInput(format!("Unknown submission status: {}", other))),
        }
    }
}

/// Coach-assigned rating of a reviewed submission
///
/// Any medal other than `None` means the level was passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Medal {
    None,
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::None => "NONE",
            Medal::Bronze => "BRONZE",
            Medal::Silver => "SILVER",
            Medal::Gold => "GOLD",
        }
    }

    pub fn is_awarded(&self) -> bool {
        !matches!(self, Medal::None)
    }
}

impl FromStr for Medal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NONE" => Ok(Medal::None),
            "BRONZE" => Ok(Medal::Bronze),
            "SILVER" => Ok(Medal::Silver),
            "GOLD" => Ok(Medal::Gold),
            other => Err(Error::InvalidInput(format!("Unknown medal: {}", other))),
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour scheme of the web client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "LIGHT",
            Theme::Dark => "DARK",
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LIGHT" => Ok(Theme::Light),
            "DARK" => Ok(Theme::Dark),
            other => Err(Error::InvalidInput(format!("Unknown theme: {}", other))),
        }
    }
}

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nl,
    Fr,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Nl => "nl",
            Language::Fr => "fr",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "en" => Ok(Language::En),
            "nl" => Ok(Language::Nl),
            "fr" => Ok(Language::Fr),
            other => Err(Error::InvalidInput(format!("Unknown language: {}", other))),
        }
    }
}

/// Per-user preferences; users without a stored row get the defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    pub push_notifications: bool,
    pub email_notifications: bool,
    pub theme: Theme,
    pub language: Language,
}

impl UserSettings {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            push_notifications: row.try_get("push_notifications")?,
            email_notifications: row.try_get("email_notifications")?,
            theme: row
                .try_get::<String, _>("theme")?
                .parse()
                .map_err(|_| Error::CorruptRecord("user_settings.theme".to_string()))?,
            language: row
                .try_get::<String, _>("language")?
                .parse()
                .map_err(|_| Error::CorruptRecord("user_settings.language".to_string()))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Login account (coach or parent)
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Coach assigned to a parent account
    pub coach_id: Option<Uuid>,
    pub phone: Option<String>,
    /// Coach profile text shown to parents
    pub bio: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: row.try_get::<String, _>("role")?.parse()?,
            coach_id: parse_optional_uuid(row.try_get("coach_id")?)?,
            phone: row.try_get("phone")?,
            bio: row.try_get("bio")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        })
    }
}

/// A child enrolled in the program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pupil {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub parent_id: Uuid,
    pub coach_id: Uuid,
    /// Highest fully-completed level number (0 = none yet)
    pub progress: i64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Pupil {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let date_of_birth: Option<String> = row.try_get("date_of_birth")?;
        Ok(Self {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            name: row.try_get("name")?,
            date_of_birth: date_of_birth
                .map(|s| {
                    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .map_err(|e| Error::CorruptRecord(format!("Invalid date_of_birth {}: {}", s, e)))
                })
                .transpose()?,
            parent_id: parse_uuid(&row.try_get::<String, _>("parent_id")?)?,
            coach_id: parse_uuid(&row.try_get::<String, _>("coach_id")?)?,
            progress: row.try_get("progress")?,
            notes: row.try_get("notes")?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        })
    }
}

/// Catalog entry: one stage of the curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub level_number: i64,
    pub title: String,
    /// Required parts in catalog order; never empty
    pub parts: Vec<String>,
}

/// Per pupil, per level completion record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub pupil_id: Uuid,
    pub level_number: i64,
    pub first_part_completed: bool,
    pub fully_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LevelProgress {
    /// Fresh record with nothing completed
    pub fn new(pupil_id: Uuid, level_number: i64) -> Self {
        Self {
            pupil_id,
            level_number,
            first_part_completed: false,
            fully_completed: false,
            completed_at: None,
        }
    }

    /// Mark the level fully completed
    ///
    /// Returns `true` when this call performed the transition; `completed_at`
    /// is only stamped on that first transition.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        self.first_part_completed = true;
        if self.fully_completed {
            return false;
        }
        self.fully_completed = true;
        self.completed_at = Some(at);
        true
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let completed_at: Option<String> = row.try_get("completed_at")?;
        Ok(Self {
            pupil_id: parse_uuid(&row.try_get::<String, _>("pupil_id")?)?,
            level_number: row.try_get("level_number")?,
            first_part_completed: row.try_get("first_part_completed")?,
            fully_completed: row.try_get("fully_completed")?,
            completed_at: completed_at.map(|s| parse_timestamp(&s)).transpose()?,
        })
    }
}

/// Parent-uploaded video evidence for a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub pupil_id: Uuid,
    pub level_number: i64,
    pub video_url: String,
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
    pub medal: Medal,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Coach has opened the video
    pub is_read: bool,
}

impl Submission {
    /// New PENDING submission without a medal
    pub fn new_pending(pupil_id: Uuid, level_number: i64, video_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            pupil_id,
            level_number,
            video_url: video_url.to_string(),
            status: SubmissionStatus::Pending,
            feedback: None,
            medal: Medal::None,
            created_at: Utc::now(),
            reviewed_at: None,
            is_read: false,
        }
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let reviewed_at: Option<String> = row.try_get("reviewed_at")?;
        Ok(Self {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            pupil_id: parse_uuid(&row.try_get::<String, _>("pupil_id")?)?,
            level_number: row.try_get("level_number")?,
            video_url: row.try_get("video_url")?,
            status: row.try_get::<String, _>("status")?.parse()?,
            feedback: row.try_get("feedback")?,
            medal: row.try_get::<String, _>("medal")?.parse()?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
            reviewed_at: reviewed_at.map(|s| parse_timestamp(&s)).transpose()?,
            is_read: row.try_get("is_read")?,
        })
    }
}

/// Chat message between a parent and their coach
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub coach_id: Uuid,
    pub sender: Role,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            parent_id: parse_uuid(&row.try_get::<String, _>("parent_id")?)?,
            coach_id: parse_uuid(&row.try_get::<String, _>("coach_id")?)?,
            sender: row.try_get::<String, _>("sender")?.parse()?,
            content: row.try_get("content")?,
            read: row.try_get("read")?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        })
    }
}

/// Persisted notification for a user
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub url: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            recipient_id: parse_uuid(&row.try_get::<String, _>("recipient_id")?)?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            url: row.try_get("url")?,
            read: row.try_get("read")?,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        })
    }
}

pub fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::CorruptRecord(format!("Invalid UUID {}: {}", value, e)))
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>> {
    value.map(|s| parse_uuid(&s)).transpose()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord(format!("Invalid timestamp {}: {}", value, e)))
}
