use yew::prelude::*;
use gloo_net::http::Request;
use log::{debug, warn};
use web_sys::{FormData, HtmlFormElement, SubmitEvent};

use crate::contact::controller::{
    decide_submit, resolve_reply, FormFields, FormStatus, ServerReply, SubmitDecision,
    TransportError, MSG_TRANSPORT_FALLBACK,
};

#[derive(Properties, PartialEq)]
pub struct ContactFormProps {
    /// Endpoint the form posts to; rendered as the form's `action`.
    pub action: String,
}

pub enum ContactFormMsg {
    Submit(SubmitEvent),
    Finished(FormStatus),
}

pub struct ContactForm {
    status: FormStatus,
    form_ref: NodeRef,
}

fn read_fields(data: &FormData) -> FormFields {
    let get = |name: &str| data.get(name).as_string().unwrap_or_default();
    FormFields {
        name: get("name"),
        email: get("email"),
        subject: get("subject"),
        message: get("message"),
    }
}

async fn post_form(action: String, data: FormData) -> FormStatus {
    let outcome = match Request::post(&action).body(data).send().await {
        Ok(response) => {
            let ok = response.ok();
            response
                .json::<ServerReply>()
                .await
                .map(|reply| (ok, reply))
                .map_err(|e| TransportError::Body(e.to_string()))
        }
        Err(e) => Err(TransportError::Network(e.to_string())),
    };
    if let Err(e) = &outcome {
        warn!("Contact form submission failed: {}", e);
    }
    resolve_reply(outcome)
}

impl Component for ContactForm {
    type Message = ContactFormMsg;
    type Properties = ContactFormProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            status: FormStatus::Idle,
            form_ref: NodeRef::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            ContactFormMsg::Submit(e) => {
                e.prevent_default();
                let Some(form) = self.form_ref.cast::<HtmlFormElement>() else {
                    return false;
                };
                let data = match FormData::new_with_form(&form) {
                    Ok(data) => data,
                    Err(_) => {
                        self.status = FormStatus::Error(MSG_TRANSPORT_FALLBACK.to_string());
                        return true;
                    }
                };

                match decide_submit(&self.status, &read_fields(&data)) {
                    SubmitDecision::Ignore => {
                        debug!("Submission already in flight, ignoring submit");
                        false
                    }
                    SubmitDecision::Reject(status) => {
                        self.status = status;
                        true
                    }
                    SubmitDecision::Send => {
                        self.status = FormStatus::Sending;
                        let action = form.action();
                        ctx.link().send_future(async move {
                            ContactFormMsg::Finished(post_form(action, data).await)
                        });
                        true
                    }
                }
            }
            ContactFormMsg::Finished(status) => {
                if matches!(status, FormStatus::Success(_)) {
                    if let Some(form) = self.form_ref.cast::<HtmlFormElement>() {
                        form.reset();
                    }
                }
                self.status = status;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let onsubmit = ctx.link().callback(ContactFormMsg::Submit);
        let sending = self.status.is_sending();

        html! {
            <form
                id="contactForm"
                class="contact-form"
                action={ctx.props().action.clone()}
                method="post"
                ref={self.form_ref.clone()}
                {onsubmit}
            >
                <div class="form-group">
                    <input type="text" name="name" placeholder="Your Name" />
                </div>
                <div class="form-group">
                    <input type="email" name="email" placeholder="Your Email" />
                </div>
                <div class="form-group">
                    <input type="text" name="subject" placeholder="Subject" />
                </div>
                <div class="form-group">
                    <textarea name="message" rows="5" placeholder="Your Message" />
                </div>
                <button type="submit" class="btn btn-primary" disabled={sending}>
                    { if sending { "Sending..." } else { "Send Message" } }
                </button>
                <div class={classes!("form-status", self.status.css_class())} role="status" aria-live="polite">
                    { self.status.text() }
                </div>
            </form>
        }
    }
}
