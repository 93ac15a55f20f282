use email_address::EmailAddress;
use lettre::{message::Mailbox, Address};
use thiserror::Error;

use crate::config::app_config::MailSettings;
use crate::handlers::contact_dtos::ContactForm;
use crate::utils::html::{escape_html, nl2br, single_line};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("field `{0}` is empty")]
    MissingField(&'static str),
    #[error("email address is malformed")]
    InvalidEmail,
}

/// A contact form submission that passed validation. Text fields are trimmed
/// but not escaped; escaping happens where they are rendered into HTML.
#[derive(Debug, Clone)]
pub struct Submission {
    name: String,
    email: Address,
    subject: String,
    message: String,
}

impl Submission {
    pub fn validate(form: ContactForm) -> Result<Self, ValidationError> {
        let name = required("name", &form.name)?;
        let subject = required("subject", &form.subject)?;
        let message = required("message", &form.message)?;
        let email = required("email", &form.email)?;
        let email = parse_email(&email).ok_or(ValidationError::InvalidEmail)?;

        Ok(Self {
            name,
            email,
            subject,
            message,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Address {
        &self.email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Strict address check: RFC 5322 shape, no display name or domain literal,
/// and a domain with at least two labels.
pub fn parse_email(email: &str) -> Option<Address> {
    if email.chars().any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>') {
        return None;
    }
    let (_, domain) = email.rsplit_once('@')?;
    if domain.starts_with('[') || domain.split('.').count() < 2 {
        return None;
    }
    if domain.split('.').any(|label| label.is_empty()) {
        return None;
    }
    if !EmailAddress::is_valid(email) {
        return None;
    }
    email.parse::<Address>().ok()
}

/// The email sent to the site owner for one submission.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: Mailbox,
    pub from: Mailbox,
    pub reply_to: Address,
    pub subject: String,
    pub html_body: String,
}

impl Notification {
    pub fn compose(submission: &Submission, settings: &MailSettings) -> Self {
        let subject = single_line(&format!(
            "{}: {}",
            settings.subject_prefix,
            submission.subject()
        ));

        let html_body = format!(
            "<h2>New Message from {site}</h2>\n\
             <p><strong>Name:</strong> {name}</p>\n\
             <p><strong>Email:</strong> {email}</p>\n\
             <p><strong>Subject:</strong> {subject}</p>\n\
             <p><strong>Message:</strong><br />{message}</p>\n",
            site = escape_html(&settings.site_name),
            name = escape_html(submission.name()),
            email = escape_html(&submission.email().to_string()),
            subject = escape_html(submission.subject()),
            message = nl2br(&escape_html(submission.message())),
        );

        Self {
            to: settings.recipient.clone(),
            from: settings.sender.clone(),
            reply_to: submission.email().clone(),
            subject,
            html_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, subject: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    fn settings() -> MailSettings {
        MailSettings {
            recipient: "owner@example.com".parse().unwrap(),
            sender: "Example Site <no-reply@example.com>".parse().unwrap(),
            site_name: "Example Site".to_string(),
            subject_prefix: "New contact form submission".to_string(),
        }
    }

    #[test]
    fn trims_every_field() {
        let submission =
            Submission::validate(form("  Jane Doe ", " jane@example.com\n", "\tHello ", " hi ")).unwrap();
        assert_eq!(submission.name(), "Jane Doe");
        assert_eq!(submission.email().to_string(), "jane@example.com");
        assert_eq!(submission.subject(), "Hello");
        assert_eq!(submission.message(), "hi");
    }

    #[test]
    fn whitespace_only_fields_are_missing() {
        assert_eq!(
            Submission::validate(form("   ", "jane@example.com", "Hello", "hi")).unwrap_err(),
            ValidationError::MissingField("name")
        );
        assert_eq!(
            Submission::validate(form("Jane", "jane@example.com", "Hello", " \n\t ")).unwrap_err(),
            ValidationError::MissingField("message")
        );
        assert_eq!(
            Submission::validate(form("Jane", "", "Hello", "hi")).unwrap_err(),
            ValidationError::MissingField("email")
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in [
            "jane",
            "jane@",
            "@example.com",
            "jane@localhost",
            "jane@example.",
            "jane@.com",
            "jane@exa mple.com",
            "jane@@example.com",
            "Jane <jane@example.com>",
            "jane@[127.0.0.1]",
            "jane@example..com",
        ] {
            assert!(parse_email(bad).is_none(), "{bad} should be rejected");
        }
    }

    #[test]
    fn accepts_ordinary_emails() {
        for good in ["jane@example.com", "jane.doe+site@mail.example.co.uk", "j_d-1@sub.example.org"] {
            assert!(parse_email(good).is_some(), "{good} should be accepted");
        }
    }

    #[test]
    fn composes_escaped_body_with_line_breaks() {
        let submission = Submission::validate(form(
            "Jane <b>Doe</b>",
            "jane@example.com",
            "Hello",
            "Line1\nLine2 <script>alert(1)</script>",
        ))
        .unwrap();
        let notification = Notification::compose(&submission, &settings());

        assert_eq!(notification.subject, "New contact form submission: Hello");
        assert_eq!(notification.reply_to.to_string(), "jane@example.com");
        assert_eq!(notification.to.email.to_string(), "owner@example.com");
        assert!(notification.html_body.contains("<h2>New Message from Example Site</h2>"));
        assert!(notification.html_body.contains("Jane &lt;b&gt;Doe&lt;/b&gt;"));
        assert!(notification.html_body.contains("Line1<br />\nLine2"));
        assert!(notification.html_body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!notification.html_body.contains("<script>"));
    }

    #[test]
    fn subject_cannot_smuggle_headers() {
        let submission = Submission::validate(form(
            "Jane",
            "jane@example.com",
            "Hi\r\nBcc: someone@example.com",
            "hi",
        ))
        .unwrap();
        let notification = Notification::compose(&submission, &settings());
        assert!(!notification.subject.contains('\n'));
        assert!(!notification.subject.contains('\r'));
    }
}
