use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::database::models::{Employee, TimeOffRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Default,
    Approved,
    Rejected,
}

/// Outbound notification contract. Sends are fire-and-forget: the boolean is
/// informational only and a failed send never unwinds the transition that
/// triggered it.
pub trait Mailer: Send + Sync {
    fn send(
        &self,
        sender: &Employee,
        to_address: &str,
        request: &TimeOffRequest,
        kind: EmailKind,
    ) -> bool;
}

pub fn is_valid_email(address: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    });
    re.is_match(address)
}

pub fn compose(request: &TimeOffRequest, kind: EmailKind) -> (String, String) {
    match kind {
        EmailKind::Default => (
            format!(
                "Time off from {} to {}",
                request.start_date, request.end_date
            ),
            request.reason.clone(),
        ),
        EmailKind::Approved => (
            "[Approved] time off request".to_string(),
            "Your time off request is approved".to_string(),
        ),
        EmailKind::Rejected => (
            "[Rejected] time off request".to_string(),
            "Your time off request is rejected".to_string(),
        ),
    }
}

/// Drops each message as a plain file into a pickup directory, one file per
/// send. A real transport can pick them up from there.
pub struct PickupDirMailer {
    directory: PathBuf,
}

impl PickupDirMailer {
    pub fn new(directory: PathBuf) -> std::io::Result<Self> {
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }
}

impl Mailer for PickupDirMailer {
    fn send(
        &self,
        sender: &Employee,
        to_address: &str,
        request: &TimeOffRequest,
        kind: EmailKind,
    ) -> bool {
        if !is_valid_email(&sender.email) || !is_valid_email(to_address) {
            log::warn!("Refusing to send mail with malformed address");
            return false;
        }
        if request.reason.is_empty() {
            return false;
        }

        let (subject, body) = compose(request, kind);
        let message = format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}\n",
            sender.email, to_address, subject, body
        );

        let path = self.directory.join(format!("{}.eml", Uuid::new_v4()));
        match fs::write(&path, message) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to write mail file {}: {}", path.display(), err);
                false
            }
        }
    }
}
