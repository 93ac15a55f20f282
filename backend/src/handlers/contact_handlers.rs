use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Form, Json,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::api::mail_relay::RelayError;
use crate::handlers::contact_dtos::{
    ContactForm, ContactResponse, MSG_METHOD_NOT_ALLOWED, MSG_MISSING_FIELDS, MSG_RELAY_FAILED,
};
use crate::models::contact_models::{Notification, Submission, ValidationError};
use crate::AppState;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),
    #[error("unreadable request body: {0}")]
    Unreadable(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("mail relay failed: {0}")]
    Relay(#[from] RelayError),
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContactError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ContactError::Unreadable(_) | ContactError::Validation(_) => StatusCode::BAD_REQUEST,
            ContactError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The only text a client ever sees for this error.
    pub fn public_message(&self) -> &'static str {
        match self {
            ContactError::MethodNotAllowed(_) => MSG_METHOD_NOT_ALLOWED,
            ContactError::Unreadable(_) | ContactError::Validation(_) => MSG_MISSING_FIELDS,
            ContactError::Relay(_) => MSG_RELAY_FAILED,
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        (self.status(), ContactResponse::failed(self.public_message())).into_response()
    }
}

/// Contact form body, accepted as urlencoded, multipart or JSON.
pub struct ContactPayload(pub ContactForm);

impl<S> FromRequest<S> for ContactPayload
where
    S: Send + Sync,
{
    type Rejection = ContactError;

    fn from_request(
        req: Request,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let content_type = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase();

            let form = if content_type.starts_with("multipart/form-data") {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ContactError::Unreadable(e.body_text()))?;
                let mut form = ContactForm::default();
                while let Some(field) = multipart
                    .next_field()
                    .await
                    .map_err(|e| ContactError::Unreadable(e.to_string()))?
                {
                    let Some(name) = field.name().map(str::to_string) else {
                        continue;
                    };
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ContactError::Unreadable(e.to_string()))?;
                    form.set_field(&name, value);
                }
                form
            } else if content_type.starts_with("application/json") {
                let Json(form) = Json::<ContactForm>::from_request(req, state)
                    .await
                    .map_err(|e| ContactError::Unreadable(e.body_text()))?;
                form
            } else {
                let Form(form) = Form::<ContactForm>::from_request(req, state)
                    .await
                    .map_err(|e| ContactError::Unreadable(e.body_text()))?;
                form
            };

            Ok(ContactPayload(form))
        }
    }
}

pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    payload: Result<ContactPayload, ContactError>,
) -> Result<ContactResponse, ContactError> {
    let ContactPayload(form) = payload.map_err(|e| {
        debug!(error = %e, "Rejected contact form body");
        e
    })?;

    let submission = Submission::validate(form).map_err(|e| {
        debug!(reason = %e, "Rejected contact form submission");
        e
    })?;

    let notification = Notification::compose(&submission, &state.config.mail);
    let relay = state.mail_relay.clone();

    // The relay blocks until the mail server answers.
    let outcome = match tokio::task::spawn_blocking(move || relay.deliver(&notification)).await {
        Ok(outcome) => outcome,
        Err(e) => Err(RelayError::Worker(e.to_string())),
    };

    if let Err(e) = outcome {
        error!(error = %e, "Failed to relay contact form submission");
        return Err(ContactError::Relay(e));
    }

    info!(
        reply_to = %submission.email(),
        "Contact form submission relayed"
    );
    Ok(ContactResponse::sent())
}

pub async fn method_not_allowed(method: Method) -> ContactError {
    debug!(%method, "Contact endpoint called with wrong method");
    ContactError::MethodNotAllowed(method)
}

/// Only CORS preflights (OPTIONS with `Access-Control-Request-Method`) are
/// left for the CORS layer; a plain OPTIONS is a method error like any other.
pub async fn reject_plain_options(request: Request, next: Next) -> Result<Response, ContactError> {
    if request.method() == Method::OPTIONS
        && !request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    {
        return Err(method_not_allowed(Method::OPTIONS).await);
    }

    Ok(next.run(request).await)
}
