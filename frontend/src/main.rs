use yew::prelude::*;
use log::{info, Level};

mod config;
mod contact {
    pub mod controller;
    pub mod form;
}

use contact::form::ContactForm;

#[function_component]
pub fn App() -> Html {
    html! {
        <section id="contact" class="contact">
            <div class="container">
                <h2 class="section-title">{"Get in Touch"}</h2>
                <ContactForm action={config::contact_endpoint()} />
            </div>
        </section>
    }
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(Level::Info).expect("error initializing log");

    // Static pages provide a mount point; fall back to <body> otherwise.
    let root = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id("contact-root"));

    info!("Starting contact form");
    match root {
        Some(root) => yew::Renderer::<App>::with_root(root).render(),
        None => yew::Renderer::<App>::new().render(),
    };
}
