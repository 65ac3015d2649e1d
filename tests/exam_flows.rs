//! End-to-end flows, against a scripted server
#![cfg(feature = "integration_tests")]


use reqwest::{Method, StatusCode};

use exam_scheduler::exam::DraftField;
use exam_scheduler::form::{FormState, Navigation};
use exam_scheduler::response;
use exam_scheduler::traits::SessionStore;
use exam_scheduler::validation::{self, LoginForm, SignupForm};
use exam_scheduler::{ExamDraft, ExamForm, ExamId, GatewayError, SessionToken};

use scenarii::*;

fn login_form() -> LoginForm {
    LoginForm { email: EMAIL.to_string(), password: PASSWORD.to_string() }
}

#[tokio::test]
async fn test_full_session() {
    let _ = env_logger::builder().is_test(true).try_init();

    let client = logged_out_client();
    let server = client.gateway().transport();
    let draft = future_draft("Compilers");
    let exam = exam_from_draft(4, &draft);

    server
        .respond(StatusCode::CREATED, "User registered successfully")   // signup
        .respond(StatusCode::OK, "Exam added successfully")             // add
        .respond(StatusCode::OK, exam_list_json(&[exam.clone()]))       // list
        .respond(StatusCode::OK, exam_json(&exam))                      // edit: load
        .respond(StatusCode::OK, "Exam updated successfully")           // edit: submit
        .respond(StatusCode::UNAUTHORIZED, "")                          // delete, with an expired session
        .respond(StatusCode::OK, "[]")                                  // login
        .respond(StatusCode::NO_CONTENT, "");                           // delete, again

    // Sign up
    let signup = SignupForm { email: EMAIL.to_string(), password: PASSWORD.to_string(), confirm: PASSWORD.to_string() };
    client.signup(&signup).await.unwrap();
    assert!(client.is_authenticated());

    // Create an exam
    let mut form = ExamForm::create(&client);
    for field in DraftField::ALL.iter() {
        form.set_field(*field, draft.get(*field));
    }
    assert_eq!(form.submit().await, Some(Navigation::ExamList));

    // List exams
    let exams = client.list_exams().await.unwrap();
    assert_eq!(exams, vec![exam.clone()]);

    // Edit it
    let mut form = ExamForm::edit(&client, ExamId::from(4));
    assert_eq!(form.load().await, None);
    assert_eq!(form.draft(), &draft);
    form.set_field(DraftField::Location, "Room 12");
    assert_eq!(form.submit().await, Some(Navigation::ExamList));

    // The session expires
    let res = client.delete_exam(ExamId::from(4)).await;
    assert!(matches!(res, Err(GatewayError::SessionExpired)));
    assert!(client.is_authenticated() == false);

    // Nothing reaches the server until the user logs in again
    let sent_so_far = server.request_count();
    let mut form = ExamForm::create(&client);
    for field in DraftField::ALL.iter() {
        form.set_field(*field, draft.get(*field));
    }
    assert_eq!(form.submit().await, Some(Navigation::Login));
    assert_eq!(server.request_count(), sent_so_far);

    client.login(&login_form()).await.unwrap();
    client.delete_exam(ExamId::from(4)).await.unwrap();
    assert!(server.is_exhausted());

    let sent: Vec<(Method, String)> = server.requests().into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    assert_eq!(sent, vec![
        (Method::POST, "/api/auth/signup".to_string()),
        (Method::POST, "/api/exams/add".to_string()),
        (Method::GET, "/api/exams/all".to_string()),
        (Method::GET, "/api/exams/4".to_string()),
        (Method::PUT, "/api/exams/4".to_string()),
        (Method::DELETE, "/api/exams/4".to_string()),
        (Method::GET, "/api/exams/all".to_string()),
        (Method::DELETE, "/api/exams/4".to_string()),
    ]);

    // Every authenticated request carried the same token
    let expected = SessionToken::from_credentials(EMAIL, PASSWORD).authorization_value();
    for request in server.requests().iter().skip(1) {
        assert_eq!(request.authorization.as_deref(), Some(expected.as_str()));
    }
}

#[tokio::test]
async fn test_form_reports_every_kind_of_failure() {
    let _ = env_logger::builder().is_test(true).try_init();

    let client = logged_out_client();
    client.session().set(SessionToken::from_credentials(EMAIL, PASSWORD));
    client.gateway().transport()
        .respond(StatusCode::BAD_REQUEST, r#"{"subject":"Subject is too long","location":["Unknown room","Room is closed"]}"#)
        .respond(StatusCode::CONFLICT, r#"{"message":"An exam is already scheduled at that time"}"#)
        .respond(StatusCode::INTERNAL_SERVER_ERROR, "<html>Internal error</html>")
        .fail("connection reset by peer");

    let mut form = ExamForm::create(&client);
    // Nothing is sent while the form is invalid
    assert_eq!(form.submit().await, None);
    assert_eq!(form.field_error(DraftField::Subject), Some(validation::SUBJECT_BLANK));
    assert_eq!(form.field_error(DraftField::Date), Some(validation::DATE_REQUIRED));
    assert_eq!(form.field_error(DraftField::Time), Some(validation::TIME_REQUIRED));
    assert_eq!(form.field_error(DraftField::Location), Some(validation::LOCATION_BLANK));
    assert_eq!(client.gateway().transport().request_count(), 0);

    let draft = future_draft("Networks");
    for field in DraftField::ALL.iter() {
        form.set_field(*field, draft.get(*field));
    }

    assert_eq!(form.submit().await, None);
    let mut messages = form.server_errors().to_vec();
    messages.sort();
    assert_eq!(messages, vec!["Room is closed", "Subject is too long", "Unknown room"]);

    assert_eq!(form.submit().await, None);
    assert_eq!(form.server_errors(), ["An exam is already scheduled at that time"]);

    assert_eq!(form.submit().await, None);
    assert_eq!(form.server_errors(), ["<html>Internal error</html>"]);

    assert_eq!(form.submit().await, None);
    assert_eq!(form.server_errors(), [response::UNREACHABLE]);

    // None of these failures logged the user out
    assert!(client.is_authenticated());
    assert!(matches!(form.state(), FormState::Idle { .. }));
}

#[tokio::test]
async fn test_session_survives_restarts() {
    let _ = env_logger::builder().is_test(true).try_init();
    let folder = scratch_folder();
    let session_file = folder.join("session.json");

    {
        let client = file_client(&session_file);
        assert!(client.is_authenticated() == false);
        client.gateway().transport().respond(StatusCode::OK, "[]");
        client.login(&login_form()).await.unwrap();
    }
    assert!(session_file.exists());

    // A new process picks the session up, until the server rejects it
    {
        let client = file_client(&session_file);
        assert!(client.is_authenticated());
        client.gateway().transport().respond(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(client.list_exams().await, Err(GatewayError::SessionExpired)));
    }
    assert!(session_file.exists() == false);

    {
        let client = file_client(&session_file);
        assert!(client.is_authenticated() == false);
        assert!(matches!(client.list_exams().await, Err(GatewayError::Unauthenticated)));
        assert_eq!(client.gateway().transport().request_count(), 0);
    }

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_export_a_fetched_exam() {
    let _ = env_logger::builder().is_test(true).try_init();
    let folder = scratch_folder();

    let client = logged_out_client();
    client.session().set(SessionToken::from_credentials(EMAIL, PASSWORD));
    let exam = exam_from_draft(9, &ExamDraft::new("CS 101: Intro", "2999-06-15", "09:30", "Main hall"));
    client.gateway().transport().respond(StatusCode::OK, exam_json(&exam));

    let fetched = client.get_exam(ExamId::from(9)).await.unwrap();
    let path = exam_scheduler::ical::export_to(&fetched, &folder).unwrap();
    assert_eq!(path.file_name().unwrap(), "cs_101__intro_exam.ics");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("SUMMARY:CS 101: Intro\r\n"));
    assert!(content.contains("LOCATION:Main hall\r\n"));
    assert!(content.contains("STATUS:CONFIRMED\r\n"));

    std::fs::remove_dir_all(&folder).unwrap();
}
