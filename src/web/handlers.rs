use crate::auth::{AuthStatus, Session};
use crate::store::{self, DataStore};
use crate::views::chart::LineChart;
use crate::views::entry::{self, EntryForm};
use crate::views::{table, trend, View};
use crate::web::html::{self, Notice};
use crate::web::session::cookie;
use crate::web::AppState;
use crate::Result;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, error, warn};

pub(super) const PENDING_MESSAGE: &str = "Please enter your username and password.";
pub(super) const REJECTED_MESSAGE: &str = "Username/password is incorrect.";
pub(super) const SUBMITTED_MESSAGE: &str = "Data submitted successfully!";

#[derive(Debug, Default, Deserialize)]
pub(super) struct ViewQuery {
    view: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// `GET /`: the login gate, or the selected view.
pub(super) async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ViewQuery>,
) -> Response {
    let session = state.sessions.resume(&headers).await;
    let view = View::from_param(query.view.as_deref());
    let body = if session.is_authenticated() {
        render_view(&state, &session, view, None, None).await
    } else {
        render_login(&session)
    };
    page(&session, body)
}

/// `POST /login`: checks the credentials and shows the outcome. A successful login moves the
/// session to a new id.
pub(super) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut session = state.sessions.resume(&headers).await;
    let status = session.login(state.config.credentials(), &form.username, &form.password);
    let body = match status {
        AuthStatus::Authenticated => {
            session = state.sessions.promote(session).await;
            render_view(&state, &session, View::default(), None, None).await
        }
        AuthStatus::Pending | AuthStatus::Rejected => {
            state.sessions.discard(session.id()).await;
            render_login(&session)
        }
    };
    page(&session, body)
}

/// `POST /logout`: drops the session and hands the browser a new, unregistered id.
pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session = state.sessions.resume(&headers).await;
    state.sessions.discard(session.id()).await;
    session.logout();
    session.renew_id();
    ([(SET_COOKIE, cookie(&session))], Redirect::to("/")).into_response()
}

/// `POST /entry`: stores the submitted reading.
pub(super) async fn entry_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EntryForm>,
) -> Response {
    let session = state.sessions.resume(&headers).await;
    if !session.is_authenticated() {
        warn!("Rejected a reading submitted without logging in");
        return page(&session, render_login(&session));
    }
    let result = match connect(&state).await {
        Ok(store) => entry::submit(store.as_ref(), &form).await,
        Err(e) => Err(e),
    };
    let (form, notice) = match result {
        Ok(_) => (today_form(), Notice::success(SUBMITTED_MESSAGE)),
        Err(e) => {
            error!("Unable to store the reading: {e:#}");
            (form, Notice::from_error(&e))
        }
    };
    let body = render_view(&state, &session, View::Entry, Some(form), Some(notice)).await;
    page(&session, body)
}

/// `GET /table.csv`: the data table as a CSV download.
pub(super) async fn table_csv(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.sessions.resume(&headers).await;
    if !session.is_authenticated() {
        return (
            StatusCode::UNAUTHORIZED,
            [(SET_COOKIE, cookie(&session))],
            PENDING_MESSAGE,
        )
            .into_response();
    }
    let result = async {
        let store = connect(&state).await?;
        table::load(store.as_ref()).await?.to_csv()
    }
    .await;
    match result {
        Ok(csv) => (
            [
                (CONTENT_TYPE, "text/csv; charset=utf-8"),
                (CONTENT_DISPOSITION, "attachment; filename=\"readings.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("Unable to build the CSV download: {e:#}");
            (StatusCode::BAD_GATEWAY, Notice::from_error(&e).message).into_response()
        }
    }
}

fn page(session: &Session, body: String) -> Response {
    ([(SET_COOKIE, cookie(session))], Html(body)).into_response()
}

fn render_login(session: &Session) -> String {
    let notice = match session.status() {
        AuthStatus::Rejected => Notice::error(REJECTED_MESSAGE),
        AuthStatus::Pending | AuthStatus::Authenticated => Notice::warning(PENDING_MESSAGE),
    };
    html::login_page(Some(&notice))
}

/// Renders `view` for an authenticated session. Store failures are shown in place of the view.
async fn render_view(
    state: &AppState,
    session: &Session,
    view: View,
    form: Option<EntryForm>,
    notice: Option<Notice>,
) -> String {
    let Some(identity) = session.identity() else {
        return render_login(session);
    };
    debug!("Rendering the {view} view");
    let content = match view {
        View::Entry => html::entry_view(&form.unwrap_or_else(today_form), notice.as_ref()),
        View::Table => match load_table(state).await {
            Ok(table) => html::table_view(&table),
            Err(e) => failed(view, &e),
        },
        View::Trend => match load_trend(state).await {
            Ok(svg) => html::trend_view(&svg),
            Err(e) => failed(view, &e),
        },
    };
    html::app_page(identity, view, &content)
}

fn failed(view: View, e: &crate::Error) -> String {
    error!("Unable to render the {view} view: {e:#}");
    html::failed_view(view, &Notice::from_error(e))
}

async fn load_table(state: &AppState) -> Result<table::Table> {
    let store = connect(state).await?;
    table::load(store.as_ref()).await
}

async fn load_trend(state: &AppState) -> Result<String> {
    let store = connect(state).await?;
    let series = trend::load(store.as_ref()).await?;
    LineChart::gas().render_trend(&series)
}

/// Every render opens its own connection.
async fn connect(state: &AppState) -> Result<Box<dyn DataStore>> {
    store::connect(state.config.store_secrets(), state.mode).await
}

fn today_form() -> EntryForm {
    EntryForm::blank(chrono::Local::now().date_naive())
}
