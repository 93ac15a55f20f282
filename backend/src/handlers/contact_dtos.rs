use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const MSG_SENT: &str = "Thank you! Your message has been sent.";
pub const MSG_MISSING_FIELDS: &str = "Please provide all required fields.";
pub const MSG_RELAY_FAILED: &str = "Unable to send your message. Please try again later.";
pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Raw form body as posted by the browser. Missing fields are empty strings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn set_field(&mut self, field: &str, value: String) {
        match field {
            "name" => self.name = value,
            "email" => self.email = value,
            "subject" => self.subject = value,
            "message" => self.message = value,
            _ => {}
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

impl ContactResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: MSG_SENT.to_string(),
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ContactResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
