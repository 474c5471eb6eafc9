use axum::{
    Json,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration as CookieDuration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::web::{
    AppState,
    responses::{ApiError, json_error},
    templates::render_login_page,
};

pub const ADMIN_COOKIE: &str = "isAdmin";
pub const ADMIN_COOKIE_TTL_DAYS: i64 = 1;

const INVALID_CREDENTIALS: &str = "Неверный логин или пароль";

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub status: &'static str,
    pub is_admin: bool,
}

pub fn has_admin_flag(jar: &CookieJar) -> bool {
    jar.get(ADMIN_COOKIE)
        .is_some_and(|cookie| cookie.value() == "true")
}

pub async fn login_page(jar: CookieJar) -> Result<Html<String>, Redirect> {
    if has_admin_flag(&jar) {
        return Err(Redirect::to("/admin"));
    }

    Ok(Html(render_login_page(None)))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), (StatusCode, Html<String>)> {
    if !state.config().admin.matches(&form.username, &form.password) {
        warn!(username = %form.username.trim(), "admin login rejected");
        return Err((
            StatusCode::UNAUTHORIZED,
            Html(render_login_page(Some(INVALID_CREDENTIALS))),
        ));
    }

    info!(username = %form.username.trim(), "admin logged in");
    let mut cookie = Cookie::new(ADMIN_COOKIE, "true");
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(ADMIN_COOKIE_TTL_DAYS));

    Ok((jar.add(cookie), Redirect::to("/admin")))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let mut removal = Cookie::new(ADMIN_COOKIE, "");
    removal.set_path("/");
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));

    (jar.remove(removal), Redirect::to("/admin/login"))
}

/// Credential check used by the client-side admin panel; the caller keeps the flag itself.
pub async fn api_login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state.config().admin.matches(&form.username, &form.password) {
        warn!(username = %form.username.trim(), "admin api login rejected");
        return Err(json_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    Ok(Json(LoginResponse {
        status: "success",
        is_admin: true,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use serde_json::json;

    use crate::web::testing::TestApp;

    #[tokio::test]
    async fn api_login_accepts_configured_pair() {
        let app = TestApp::new();
        let (status, body) = app
            .json(
                Method::POST,
                "/api/admin/login",
                json!({"username": " admin ", "password": "admin123"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAdmin"], true);
    }

    #[tokio::test]
    async fn api_login_rejects_wrong_password() {
        let app = TestApp::new();
        let (status, body) = app
            .json(
                Method::POST,
                "/api/admin/login",
                json!({"username": "admin", "password": "nope"}),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn form_login_sets_flag_cookie() {
        let app = TestApp::new();
        let response = app
            .form("/admin/login", "username=admin&password=admin123")
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("isAdmin=true"));
    }

    #[tokio::test]
    async fn form_login_with_bad_password_shows_form_again() {
        let app = TestApp::new();
        let response = app
            .form("/admin/login", "username=admin&password=wrong")
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_expires_cookie() {
        let app = TestApp::new();
        let response = app
            .request(Method::GET, "/admin/logout", Some("isAdmin=true"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.contains("Max-Age=0"));
    }
}
