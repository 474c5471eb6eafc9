use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;

use crate::web::auth::has_admin_flag;

/// Gate for server-rendered `/admin` pages: only the presence of the flag cookie is checked.
pub fn require_admin(jar: &CookieJar) -> Result<(), Redirect> {
    if has_admin_flag(jar) {
        Ok(())
    } else {
        Err(Redirect::to("/admin/login"))
    }
}
