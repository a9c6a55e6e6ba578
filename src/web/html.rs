//! Server-side HTML rendering of the login page and the three views.

use crate::auth::Identity;
use crate::error::ErrorType;
use crate::utils::escape;
use crate::views::entry::EntryForm;
use crate::views::table::Table;
use crate::views::View;
use crate::Error;
use std::fmt::Write;

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;display:flex;min-height:100vh}\
nav{width:16rem;background:#f0f2f6;padding:1rem}\
nav a{display:block;padding:.4rem .6rem;color:#262730;text-decoration:none;border-radius:.3rem}\
nav a.selected{background:#ff4b4b;color:#fff}\
main{flex:1;padding:1rem 2rem}\
label{display:block;margin-top:.6rem}\
table{border-collapse:collapse}td,th{border:1px solid #ddd;padding:.2rem .5rem;text-align:right}\
.notice{padding:.6rem 1rem;border-radius:.3rem;margin:.6rem 0}\
.success{background:#dff5e3}.warning{background:#fff6d6}.error{background:#ffe1e1}";

/// A message shown above the page content.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    fn class(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    /// Shows the whole context chain of `err`. The outermost context is its `ErrorType` when one
    /// was attached.
    pub fn from_error(err: &Error) -> Self {
        let message = match ErrorType::of(err) {
            Some(_) => format!("{err:#}"),
            None => format!("{}: {err:#}", ErrorType::Service),
        };
        Self::error(message)
    }

    fn render(&self) -> String {
        format!(
            r#"<div class="notice {}" role="alert">{}</div>"#,
            self.level.class(),
            escape(&self.message)
        )
    }
}

const TITLE: &str = "Utilities Data Management";
const INTRO: &str = "Enter new utilities usage data and get electricity and gas usage analysis.";

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
        <title>{TITLE}</title><style>{STYLE}</style></head><body>{body}</body></html>"
    )
}

/// The login gate.
pub fn login_page(notice: Option<&Notice>) -> String {
    let mut body = String::from("<main><h1>Login</h1>");
    if let Some(notice) = notice {
        body.push_str(&notice.render());
    }
    body.push_str(
        r#"<form method="post" action="/login">
<label>Username <input name="username" autocomplete="username" required></label>
<label>Password <input name="password" type="password" autocomplete="current-password" required></label>
<p><button type="submit">Login</button></p>
</form></main>"#,
    );
    document(&body)
}

/// The authenticated page: the sidebar with the user, the menu and the logout button, then
/// `content` for the `selected` view.
pub fn app_page(identity: &Identity, selected: View, content: &str) -> String {
    let mut body = String::from("<nav>");
    let _ = write!(
        body,
        "<p>Logged in user: <em>{}</em></p>",
        escape(&identity.display_name)
    );
    body.push_str(r#"<form method="post" action="/logout"><button type="submit">Logout</button></form><h3>Main menu</h3>"#);
    for view in View::ALL {
        let class = if view == selected { " class=\"selected\"" } else { "" };
        let _ = write!(body, r#"<a href="/?view={view}"{class}>{}</a>"#, view.label());
    }
    let _ = write!(
        body,
        "</nav><main><h1>{TITLE}</h1><p>{INTRO}</p>{content}</main>"
    );
    document(&body)
}

/// The reading form, filled with `form`.
pub fn entry_view(form: &EntryForm, notice: Option<&Notice>) -> String {
    let mut html = String::from("<h1>Data entry</h1>");
    if let Some(notice) = notice {
        html.push_str(&notice.render());
    }
    let _ = write!(
        html,
        r#"<form method="post" action="/entry"><label>Date <input name="date" type="date" value="{}" required></label>"#,
        escape(&form.date)
    );
    for (name, label, value) in [
        ("electricity_day", "Electricity Day", &form.electricity_day),
        ("electricity_night", "Electricity Night", &form.electricity_night),
        ("electricity_car", "Electricity Car", &form.electricity_car),
        ("gas", "Gas", &form.gas),
    ] {
        let _ = write!(
            html,
            r#"<label>{label} <input name="{name}" type="number" min="0" step="any" value="{}" required></label>"#,
            escape(value)
        );
    }
    html.push_str(r#"<p><button type="submit">Submit</button></p></form>"#);
    html
}

/// The grid of stored readings, with a leading positional index column.
pub fn table_view(table: &Table) -> String {
    let mut html = String::from(
        r#"<h1>Data table</h1><p><a href="/table.csv" download>Download CSV</a></p><table><thead><tr><th></th>"#,
    );
    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr></thead><tbody>");
    for (i, row) in table.rows.iter().enumerate() {
        let _ = write!(html, "<tr><th>{i}</th>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// The gas chart. `svg` is already rendered markup.
pub fn trend_view(svg: &str) -> String {
    format!("<h1>Data plots</h1><figure>{svg}</figure>")
}

/// The heading of `view` followed by an error in place of its content.
pub fn failed_view(view: View, notice: &Notice) -> String {
    format!("<h1>{}</h1>{}", view.label(), notice.render())
}
