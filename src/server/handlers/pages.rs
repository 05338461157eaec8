// ===== src/server/handlers/pages.rs =====
use crate::core::constants::{APP_TITLE, VERSION};
use crate::server::types::AppState;
use actix_web::{web, HttpResponse, Result as ActixResult};

const LOGIN_TEMPLATE: &str = include_str!("../templates/login.html");
const EDITOR_TEMPLATE: &str = include_str!("../templates/editor.html");

// GET /: folder browser and editor
pub async fn editor_page(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_editor(state.scripts.extension())))
}

pub fn render_editor(extension: &str) -> String {
    EDITOR_TEMPLATE
        .replace("{{TITLE}}", APP_TITLE)
        .replace("{{VERSION}}", VERSION)
        .replace("{{EXTENSION}}", &escape_html(extension))
}

pub fn render_login(error: Option<&str>) -> String {
    let error_block = match error {
        Some(msg) => format!(r#"<div class="error">{}</div>"#, escape_html(msg)),
        None => String::new(),
    };
    LOGIN_TEMPLATE
        .replace("{{TITLE}}", APP_TITLE)
        .replace("{{ERROR}}", &error_block)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
