//! A module to build iCal files

use std::error::Error;

use chrono::{DateTime, Duration, Utc};
use ics::properties::{Description, DtEnd, DtStart, Location, Status, Summary};
use ics::components::Property;
use ics::{escape_text, Event, ICalendar};
use uuid::Uuid;

use crate::config::ical_product_id;
use crate::exam::Exam;

/// The server does not know how long exams last, this is assumed
pub const EXAM_DURATION_HOURS: i64 = 2;

/// Create an iCal file that contains a single event for this exam
pub fn build_event(exam: &Exam) -> Result<String, Box<dyn Error>> {
    let start = *exam.exam_date();
    let end = start.checked_add_signed(Duration::hours(EXAM_DURATION_HOURS))
        .ok_or_else(|| format!("Exam {} ends out of the supported time range", exam.id()))?;

    let uid = Uuid::new_v4().to_hyphenated().to_string();
    let mut event = Event::new(uid, format_date_time(&Utc::now()));
    event.push(Summary::new(escape_text(exam.subject().to_string())));
    event.push(Description::new(escape_text(format!("Exam for {}", exam.subject()))));
    if exam.location().is_empty() == false {
        event.push(Location::new(escape_text(exam.location().to_string())));
    }
    event.push(DtStart::new(format_date_time(&start)));
    event.push(DtEnd::new(format_date_time(&end)));
    event.push(Status::confirmed());
    event.push(Property::new("X-MICROSOFT-CDO-BUSYSTATUS", "BUSY"));

    let mut calendar = ICalendar::new("2.0", ical_product_id());
    calendar.add_event(event);

    Ok(calendar.to_string())
}

/// UTC date-time, in the iCal basic format (e.g. `20310502T080000Z`)
pub fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
