use serde::Deserialize;

pub const MSG_EMPTY_FIELDS: &str = "Please fill in all fields.";
pub const MSG_INVALID_EMAIL: &str = "Please enter a valid email address.";
pub const MSG_SENDING: &str = "Sending your message...";
pub const MSG_SENT_FALLBACK: &str = "Thank you! Your message has been sent.";
pub const MSG_SERVER_FALLBACK: &str = "Unable to send your message. Please try again later.";
pub const MSG_TRANSPORT_FALLBACK: &str = "Something went wrong. Please try again.";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl FormFields {
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

/// Lightweight `local@domain.tld` check. The server does the strict one.
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |part: &str| !part.is_empty() && !part.chars().any(|c| c.is_whitespace() || c == '@');
    if !clean(local) || !clean(domain) {
        return false;
    }
    // needs a dot with something on both sides
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn validate_fields(fields: &FormFields) -> Result<(), &'static str> {
    let fields = fields.trimmed();
    if fields.name.is_empty()
        || fields.email.is_empty()
        || fields.subject.is_empty()
        || fields.message.is_empty()
    {
        return Err(MSG_EMPTY_FIELDS);
    }
    if !looks_like_email(&fields.email) {
        return Err(MSG_INVALID_EMAIL);
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormStatus {
    Idle,
    Sending,
    Success(String),
    Error(String),
}

impl FormStatus {
    pub fn text(&self) -> &str {
        match self {
            FormStatus::Idle => "",
            FormStatus::Sending => MSG_SENDING,
            FormStatus::Success(message) | FormStatus::Error(message) => message,
        }
    }

    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            FormStatus::Idle => None,
            FormStatus::Sending => Some("sending"),
            FormStatus::Success(_) => Some("success"),
            FormStatus::Error(_) => Some("error"),
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self, FormStatus::Sending)
    }
}

#[derive(Debug, PartialEq)]
pub enum SubmitDecision {
    /// A submission is already in flight.
    Ignore,
    Reject(FormStatus),
    Send,
}

pub fn decide_submit(status: &FormStatus, fields: &FormFields) -> SubmitDecision {
    if status.is_sending() {
        return SubmitDecision::Ignore;
    }
    match validate_fields(fields) {
        Ok(()) => SubmitDecision::Send,
        Err(message) => SubmitDecision::Reject(FormStatus::Error(message.to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum TransportError {
    Network(String),
    Body(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(e) => write!(f, "network error: {}", e),
            TransportError::Body(e) => write!(f, "unreadable response: {}", e),
        }
    }
}

/// Maps the endpoint's answer (HTTP ok flag plus parsed body) to what the
/// form shows next.
pub fn resolve_reply(outcome: Result<(bool, ServerReply), TransportError>) -> FormStatus {
    let non_empty = |message: Option<String>| message.filter(|m| !m.trim().is_empty());
    match outcome {
        Ok((true, reply)) if reply.success => FormStatus::Success(
            non_empty(reply.message).unwrap_or_else(|| MSG_SENT_FALLBACK.to_string()),
        ),
        Ok((_, reply)) => FormStatus::Error(
            non_empty(reply.message).unwrap_or_else(|| MSG_SERVER_FALLBACK.to_string()),
        ),
        Err(_) => FormStatus::Error(MSG_TRANSPORT_FALLBACK.to_string()),
    }
}
