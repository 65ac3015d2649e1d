//! Exams, as stored by the server, and drafts, as edited by the user

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Format of the `date` field of a draft
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of the `time` field of a draft
pub const TIME_FORMAT: &str = "%H:%M";


/// The server-side identifier of an exam
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(u64);

impl ExamId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}
impl From<u64> for ExamId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
impl FromStr for ExamId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}
impl Display for ExamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}


/// An exam, as returned by the server
///
/// The client never keeps these longer than needed: every screen fetches its own copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    id: ExamId,
    subject: String,
    /// When the exam starts. The server may omit the offset, in which case this is UTC.
    #[serde(with = "exam_date_format")]
    exam_date: DateTime<Utc>,
    #[serde(default)]
    location: Option<String>,
}

impl Exam {
    pub fn new(id: ExamId, subject: String, exam_date: DateTime<Utc>, location: String) -> Self {
        Self { id, subject, exam_date, location: Some(location) }
    }

    pub fn id(&self) -> ExamId              { self.id }
    pub fn subject(&self) -> &str           { &self.subject }
    pub fn exam_date(&self) -> &DateTime<Utc> { &self.exam_date }
    pub fn location(&self) -> &str          { self.location.as_deref().unwrap_or("") }

    /// The start of the exam, in the local timezone of this machine
    pub fn local_start(&self) -> DateTime<Local> {
        self.exam_date.with_timezone(&Local)
    }
}

/// Format a UTC timestamp the way the API expects it, e.g. `2025-10-03T10:30:00.000Z`
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse an `examDate` sent by the server.
///
/// RFC 3339 timestamps are accepted, as well as timestamps without any offset (which are read as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

mod exam_date_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid exam date {:?}", s)))
    }
}


/// The fields of an exam form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DraftField {
    Subject,
    Date,
    Time,
    Location,
}

impl DraftField {
    pub const ALL: [DraftField; 4] = [DraftField::Subject, DraftField::Date, DraftField::Time, DraftField::Location];

    pub fn name(&self) -> &'static str {
        match self {
            DraftField::Subject => "subject",
            DraftField::Date => "date",
            DraftField::Time => "time",
            DraftField::Location => "location",
        }
    }
}

impl Display for DraftField {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.name())
    }
}


/// The content of an exam form, while the user is typing it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExamDraft {
    pub subject: String,
    /// `YYYY-MM-DD`, local calendar date
    pub date: String,
    /// `HH:MM`, local time
    pub time: String,
    pub location: String,
}

impl ExamDraft {
    pub fn new<S, D, T, L>(subject: S, date: D, time: T, location: L) -> Self
    where
        S: ToString, D: ToString, T: ToString, L: ToString,
    {
        Self {
            subject: subject.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            location: location.to_string(),
        }
    }

    /// Split the timestamp of an existing exam into local date and time fields
    pub fn from_exam(exam: &Exam) -> Self {
        let start = exam.local_start();
        Self {
            subject: exam.subject().to_string(),
            date: start.format(DATE_FORMAT).to_string(),
            time: start.format(TIME_FORMAT).to_string(),
            location: exam.location().to_string(),
        }
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Subject => &self.subject,
            DraftField::Date => &self.date,
            DraftField::Time => &self.time,
            DraftField::Location => &self.location,
        }
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Subject => self.subject = value,
            DraftField::Date => self.date = value,
            DraftField::Time => self.time = value,
            DraftField::Location => self.location = value,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    pub fn parsed_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, TIME_FORMAT).ok()
    }

    /// Combine the local date and time fields into a single UTC timestamp.
    ///
    /// Returns `None` if a field cannot be parsed, or if this local time does not exist (e.g. skipped by a DST change)
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let naive = self.parsed_date()?.and_time(self.parsed_time()?);
        Local.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}


/// Body of `POST /api/exams/add`. Date and time are sent separately
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExamRequest {
    pub subject: String,
    pub exam_date: String,
    pub exam_time: String,
    pub location: String,
}

impl From<&ExamDraft> for AddExamRequest {
    fn from(draft: &ExamDraft) -> Self {
        Self {
            subject: draft.subject.clone(),
            exam_date: draft.date.clone(),
            exam_time: draft.time.clone(),
            location: draft.location.clone(),
        }
    }
}

/// Body of `PUT /api/exams/{id}`. Date and time are merged into one ISO timestamp
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExamRequest {
    pub subject: String,
    pub exam_date: String,
    pub location: String,
}

impl UpdateExamRequest {
    /// Returns `None` in case the draft date and time do not make a valid local timestamp
    pub fn from_draft(draft: &ExamDraft) -> Option<Self> {
        let timestamp = draft.timestamp()?;
        Some(Self {
            subject: draft.subject.clone(),
            exam_date: format_timestamp(&timestamp),
            location: draft.location.clone(),
        })
    }
}
