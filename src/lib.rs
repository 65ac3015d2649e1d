//! This crate provides a client for an exam-scheduling REST API.
//!
//! Users sign up, log in, and manage their personal exams (subject, date, time and location).
//! Every operation is available as a typed method on the [`ExamClient`](client::ExamClient).
//!
//! All requests go through a single [`Gateway`](gateway::Gateway), that attaches the credentials kept in a [`SessionStore`](traits::SessionStore) and reacts to expired sessions the same way for every route. \
//! Failed responses are turned into human-readable messages by the [`response`] module.
//!
//! The create and edit screens of a front end share a single controller, [`ExamForm`](form::ExamForm), that validates drafts locally before anything is sent to the server.
//! A single exam can also be exported as an iCalendar file, see the [`ical`] module.

pub mod traits;

pub mod config;
pub mod exam;
pub use exam::{Exam, ExamDraft, ExamId};
pub mod validation;
pub mod session;
pub use session::SessionToken;
pub mod response;
pub mod gateway;
pub use gateway::{Gateway, GatewayError};
pub mod transport;
pub mod client;
pub use client::ExamClient;
pub mod form;
pub use form::ExamForm;
pub mod ical;

#[cfg(any(test, feature = "mock_transport"))]
pub mod mock_transport;

/// The usual client: a session persisted in a file, and a real HTTP connection
pub type ExamScheduler = ExamClient<session::FileSessionStore, transport::HttpTransport>;
