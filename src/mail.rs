use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{MailTransport, Settings};

#[derive(Error, Debug)]
pub enum MailError {
    #[error("No recipients")]
    NoRecipients,

    #[error("Failed to run mail transport: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Mail transport exited with {0}")]
    Rejected(String),

    #[error("Line break in {0} header")]
    HeaderInjection(&'static str),
}

fn check_header(name: &'static str, value: &str) -> Result<(), MailError> {
    if value.contains(['\r', '\n']) {
        return Err(MailError::HeaderInjection(name));
    }
    Ok(())
}

// Longest UTF-8 run per encoded word, keeping each word under 75 octets.
const ENCODED_WORD_BYTES: usize = 45;

/// RFC 2047 form of a header value: ASCII passes through, anything else
/// becomes base64 encoded words folded onto continuation lines.
pub fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut start = 0;
    for (i, c) in value.char_indices() {
        if i + c.len_utf8() - start > ENCODED_WORD_BYTES {
            words.push(&value[start..i]);
            start = i;
        }
    }
    words.push(&value[start..]);

    words
        .into_iter()
        .map(|word| format!("=?utf-8?b?{}?=", general_purpose::STANDARD.encode(word)))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

/// A fully-addressed plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub reply_to: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Envelope {
    /// Address a message the way the organizers expect: a single recipient
    /// is written to directly with the organizers copied; a group message
    /// goes to the organizers with everyone else blind-copied.
    pub fn compose(
        from: &str,
        reply_to: &str,
        recipients: &[String],
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, MailError> {
        let subject = subject.into();
        check_header("From", from)?;
        check_header("Reply-To", reply_to)?;
        check_header("Subject", &subject)?;
        for recipient in recipients {
            check_header("To", recipient)?;
        }

        let (to, cc, bcc) = match recipients {
            [] => return Err(MailError::NoRecipients),
            [only] => (vec![only.clone()], vec![reply_to.to_string()], Vec::new()),
            many => (vec![reply_to.to_string()], Vec::new(), many.to_vec()),
        };

        Ok(Self {
            from: from.to_string(),
            reply_to: reply_to.to_string(),
            to,
            cc,
            bcc,
            subject,
            body: body.into(),
        })
    }

    /// Everyone who should receive a copy.
    pub fn recipients(&self) -> impl Iterator<Item = &String> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// RFC 5322 rendering for sendmail. Bcc is left out of the headers;
    /// sendmail is told about those recipients on its command line.
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::new();
        message.push_str(&format!("From: {}\r\n", self.from));
        message.push_str(&format!("Reply-To: {}\r\n", self.reply_to));
        message.push_str(&format!("To: {}\r\n", self.to.join(", ")));
        if !self.cc.is_empty() {
            message.push_str(&format!("Cc: {}\r\n", self.cc.join(", ")));
        }
        message.push_str(&format!("Subject: {}\r\n", encode_header(&self.subject)));
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("\r\n");
        message.push_str(&self.body.replace("\r\n", "\n").replace('\n', "\r\n"));
        message
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<(), MailError>;
}

/// Logs messages instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, envelope: &Envelope) -> Result<(), MailError> {
        info!(
            subject = %envelope.subject,
            recipients = envelope.recipients().count(),
            "Mail not delivered (log transport)"
        );
        debug!(body = %envelope.body, "Mail body");
        Ok(())
    }
}

/// Hands messages to a local sendmail binary.
#[derive(Debug)]
pub struct SendmailMailer {
    path: String,
}

impl SendmailMailer {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Mailer for SendmailMailer {
    #[tracing::instrument(skip_all, fields(subject = %envelope.subject))]
    async fn send(&self, envelope: &Envelope) -> Result<(), MailError> {
        let mut child = Command::new(&self.path)
            .arg("-i")
            .arg("-f")
            .arg(&envelope.reply_to)
            .arg("--")
            .args(envelope.recipients())
            .stdin(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(envelope.to_rfc5322().as_bytes()).await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            warn!(%status, "sendmail refused message");
            return Err(MailError::Rejected(status.to_string()));
        }

        info!(recipients = envelope.recipients().count(), "Mail handed to sendmail");
        Ok(())
    }
}

/// Keeps every message in memory. Useful for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Envelope>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, envelope: &Envelope) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(envelope.clone());
        }
        Ok(())
    }
}

pub fn mailer_for(settings: &Settings) -> Arc<dyn Mailer> {
    match &settings.mail_transport {
        MailTransport::Log => Arc::new(LogMailer),
        MailTransport::Sendmail { path } => Arc::new(SendmailMailer::new(path.clone())),
    }
}

/// Body of the message sent to a new registrant.
pub fn registration_email(site_title: &str, name: &str, link: &str) -> String {
    format!(
        "Dear {name},\n\
         \n\
         Thank you for registering for the {site_title}.\n\
         \n\
         You can review your registration, purchases and payments at:\n\
         \n\
         {link}\n\
         \n\
         Please keep this link private: anyone who has it can see your details.\n\
         \n\
         See you soon,\n\
         The {site_title} organizers\n"
    )
}
