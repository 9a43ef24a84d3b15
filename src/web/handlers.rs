use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use handlebars::RenderError;
use tracing::{error, info, warn};

use crate::consts::FALLBACK_ANSWER;

use super::AppState;
use super::models::HelloForm;

const FAVICON: &[u8] = include_bytes!("../../static/favicon.ico");
const FAVICON_CONTENT_TYPE: &str = "image/vnd.microsoft.icon";

pub async fn index(State(state): State<AppState>) -> Response {
    info!("request for index page received");
    page(state.pages.index())
}

pub async fn favicon() -> Response {
    ([(header::CONTENT_TYPE, FAVICON_CONTENT_TYPE)], FAVICON).into_response()
}

pub async fn hello(
    State(state): State<AppState>,
    form: Result<Form<HelloForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            info!(%rejection, "request for hello page with unreadable form -- redirecting");
            return redirect_home();
        }
    };

    let Some(question) = form.question() else {
        info!("request for hello page received with no name or blank name -- redirecting");
        return redirect_home();
    };
    info!(%question, "request for hello page received");

    let answer = match state.gateway.answer(question, &state.dialect).await {
        Ok(result) => result.output,
        Err(e) => {
            warn!(error = %e, "agent failed, answering with fallback");
            FALLBACK_ANSWER.to_string()
        }
    };
    info!(%answer, "answer ready");

    page(state.pages.hello(&answer))
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<!doctype html><title>404 Not Found</title><h1>Not Found</h1>"),
    )
        .into_response()
}

fn redirect_home() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

fn page(rendered: Result<String, RenderError>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}
