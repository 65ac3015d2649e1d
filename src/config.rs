//! Support for library configuration options

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use url::Url;

/// Part of the ProdID string that describes the organization (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static ORG_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("My organization".to_string())));

/// Part of the ProdID string that describes the product name (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("ExamScheduler".to_string())));

/// The name of the persisted entry that holds the session token
pub const TOKEN_KEY: &str = "authToken";

/// Environment variable that overrides the API base URL
pub const URL_ENV_VAR: &str = "EXAM_SCHEDULER_URL";
/// Environment variable that overrides the path of the session file
pub const SESSION_ENV_VAR: &str = "EXAM_SCHEDULER_SESSION";

const DEFAULT_URL: &str = "http://localhost:8080";
const DEFAULT_SESSION_FILE: &str = ".config/exam-scheduler/session.json";

/// Where to reach the API, and where to keep the session between runs
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub api_url: Url,
    pub session_file: PathBuf,
}

impl Settings {
    /// Build settings from the environment, falling back to defaults for missing variables
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let url = env::var(URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_url = Url::parse(&url)
            .map_err(|err| format!("Invalid {} value {:?}: {}", URL_ENV_VAR, url, err))?;

        let session_file = match env::var_os(SESSION_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_session_file(),
        };

        log::debug!("Using API at {} and session file {:?}", api_url, session_file);
        Ok(Self { api_url, session_file })
    }
}

fn default_session_file() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_SESSION_FILE),
        None => PathBuf::from("session.json"),
    }
}

/// The `PRODID` written in exported iCal files
pub fn ical_product_id() -> String {
    let org = ORG_NAME.lock().map(|s| s.clone()).unwrap_or_default();
    let product = PRODUCT_NAME.lock().map(|s| s.clone()).unwrap_or_default();
    format!("-//{}//{}//EN", org, product)
}
