//! This module exports exams as iCal files
//!
//! It is a thin wrapper around the `ics` crate. Exams are exported as calendar events (`VEVENT`).

mod builder;
pub use builder::build_event;
pub use builder::format_date_time;
pub use builder::EXAM_DURATION_HOURS;

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::exam::Exam;

/// The name of the file an exam is exported to, e.g. `cs_101_exam.ics` for an exam of "CS 101"
pub fn export_file_name(subject: &str) -> String {
    let stem: String = subject.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    sanitize_filename::sanitize(format!("{}_exam.ics", stem))
}

/// Write the iCal file of an exam into a folder, and return its path
pub fn export_to(exam: &Exam, folder: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let content = build_event(exam)?;
    let path = folder.join(export_file_name(exam.subject()));

    std::fs::write(&path, content)
        .map_err(|err| format!("Unable to write {:?}: {}", path, err))?;
    log::info!("Exam {} exported to {:?}", exam.id(), path);
    Ok(path)
}
