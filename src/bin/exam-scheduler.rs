//! A command-line front end to the exam-scheduling API
//!
//! The API location and the session file can be set with the `EXAM_SCHEDULER_URL` and `EXAM_SCHEDULER_SESSION` environment variables.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use exam_scheduler::config::Settings;
use exam_scheduler::exam::DraftField;
use exam_scheduler::form::{FormState, Navigation};
use exam_scheduler::response::{self, error_messages};
use exam_scheduler::traits::{SessionStore, Transport};
use exam_scheduler::validation::{LoginForm, SignupForm};
use exam_scheduler::{ExamDraft, ExamForm, ExamId, ExamScheduler, GatewayError};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account, and log in with it
    Signup {
        #[clap(short, long)]
        email: String,
        #[clap(short, long)]
        password: String,
        #[clap(short, long, help = "the password, again")]
        confirm: String,
    },
    Login {
        #[clap(short, long)]
        email: String,
        #[clap(short, long)]
        password: String,
    },
    Logout,
    /// List every exam
    List,
    /// Show the details of an exam
    Show { id: ExamId },
    /// Schedule a new exam
    Add {
        #[clap(short, long)]
        subject: String,
        #[clap(short, long, help = "YYYY-MM-DD")]
        date: String,
        #[clap(short, long, help = "HH:MM")]
        time: String,
        #[clap(short, long)]
        location: String,
    },
    /// Change an existing exam. Fields that are not given are left unchanged
    Edit {
        id: ExamId,
        #[clap(short, long)]
        subject: Option<String>,
        #[clap(short, long, help = "YYYY-MM-DD")]
        date: Option<String>,
        #[clap(short, long, help = "HH:MM")]
        time: Option<String>,
        #[clap(short, long)]
        location: Option<String>,
    },
    Delete { id: ExamId },
    /// Export an exam as an iCal file
    Export {
        id: ExamId,
        #[clap(short = 'o', long, default_value = ".", help = "destination folder")]
        folder: PathBuf,
    },
}


#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        },
    };
    let client = ExamScheduler::from_settings(&settings);

    let success = match run(&client, args.command).await {
        Ok(success) => success,
        Err(err) => {
            eprintln!("{}", err);
            false
        },
    };
    if success == false {
        std::process::exit(1);
    }
}

/// Returns whether the command succeeded. Failures have already been reported to the user
async fn run(client: &ExamScheduler, command: Command) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Signup { email, password, confirm } => {
            let form = SignupForm { email, password, confirm };
            match client.signup(&form).await {
                Ok(()) => {
                    println!("Account created. You are logged in as {}", form.email);
                    Ok(true)
                },
                Err(err) => Ok(report(&err.messages())),
            }
        },

        Command::Login { email, password } => {
            let form = LoginForm { email, password };
            match client.login(&form).await {
                Ok(()) => {
                    println!("Logged in as {}", form.email);
                    Ok(true)
                },
                Err(err) => Ok(report(&err.messages())),
            }
        },

        Command::Logout => {
            client.logout();
            println!("Logged out");
            Ok(true)
        },

        Command::List => {
            let exams = match client.list_exams().await {
                Ok(exams) => exams,
                Err(err) => return Ok(report_gateway_error(&err, response::FETCH_EXAMS_FALLBACK)),
            };
            if exams.is_empty() {
                println!("No exam scheduled");
            }
            for exam in exams {
                println!("{:>5}  {}  {:<30}  {}",
                    exam.id(), exam.local_start().format("%Y-%m-%d %H:%M"), exam.subject(), exam.location());
            }
            Ok(true)
        },

        Command::Show { id } => {
            let exam = match client.get_exam(id).await {
                Ok(exam) => exam,
                Err(err) => return Ok(report_gateway_error(&err, response::FETCH_EXAM_FALLBACK)),
            };
            println!("Exam {}", exam.id());
            println!("  Subject:  {}", exam.subject());
            println!("  Date:     {}", exam.local_start().format("%A %e %B %Y, %H:%M"));
            println!("  Location: {}", exam.location());
            Ok(true)
        },

        Command::Add { subject, date, time, location } => {
            let mut form = ExamForm::create(client);
            fill(&mut form, &ExamDraft::new(subject, date, time, location), true);
            let navigation = form.submit().await;
            Ok(report_form(&form, navigation, "Exam added"))
        },

        Command::Edit { id, subject, date, time, location } => {
            let mut form = ExamForm::edit(client, id);
            if let Some(navigation) = form.load().await {
                return Ok(report_form(&form, Some(navigation), ""));
            }
            if let FormState::LoadFailed(messages) = form.state() {
                return Ok(report(messages));
            }

            let changes = ExamDraft::new(
                subject.unwrap_or_default(), date.unwrap_or_default(),
                time.unwrap_or_default(), location.unwrap_or_default());
            fill(&mut form, &changes, false);
            let navigation = form.submit().await;
            Ok(report_form(&form, navigation, "Exam updated"))
        },

        Command::Delete { id } => {
            match client.delete_exam(id).await {
                Ok(()) => {
                    println!("Exam {} deleted", id);
                    Ok(true)
                },
                Err(err) => Ok(report_gateway_error(&err, response::DELETE_EXAM_FALLBACK)),
            }
        },

        Command::Export { id, folder } => {
            let exam = match client.get_exam(id).await {
                Ok(exam) => exam,
                Err(err) => return Ok(report_gateway_error(&err, response::FETCH_EXAM_FALLBACK)),
            };
            let path = exam_scheduler::ical::export_to(&exam, &folder)?;
            println!("Exam exported to {}", path.display());
            Ok(true)
        },
    }
}

/// Copy the fields of a draft into a form. Empty fields are skipped unless `all` is set
fn fill<S: SessionStore, T: Transport>(form: &mut ExamForm<'_, S, T>, draft: &ExamDraft, all: bool) {
    for field in DraftField::ALL.iter() {
        let value = draft.get(*field);
        if all || value.is_empty() == false {
            form.set_field(*field, value);
        }
    }
}

fn report(messages: &[String]) -> bool {
    for msg in messages {
        eprintln!("Error: {}", msg);
    }
    false
}

fn report_gateway_error(err: &GatewayError, fallback: &str) -> bool {
    if err.requires_login() {
        eprintln!("{}. Run `exam-scheduler login` first", response::LOGIN_REQUIRED);
        return false;
    }
    log::debug!("{}", err);
    report(&error_messages(err, fallback))
}

fn report_form<S, T>(form: &ExamForm<'_, S, T>, navigation: Option<Navigation>, success: &str) -> bool
where
    S: SessionStore,
    T: Transport,
{
    match navigation {
        Some(Navigation::ExamList) => {
            println!("{}", success);
            true
        },
        Some(Navigation::Login) => {
            eprintln!("{}. Run `exam-scheduler login` first", response::LOGIN_REQUIRED);
            false
        },
        None => {
            for field in DraftField::ALL.iter() {
                if let Some(msg) = form.field_error(*field) {
                    eprintln!("{}: {}", field, msg);
                }
            }
            report(form.server_errors())
        },
    }
}
