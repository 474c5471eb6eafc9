use chrono::{Datelike, Utc};

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #111827; color: #f9fafb; padding: 1.5rem; }
        header a { color: #fbbf24; text-decoration: none; font-weight: 600; }
        .header-bar { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; max-width: 1080px; margin: 0 auto; }
        .header-bar h1 { margin: 0; font-size: 1.6rem; }
        nav { display: flex; gap: 1rem; flex-wrap: wrap; }
        main { padding: 2rem 1.5rem; max-width: 1080px; margin: 0 auto; box-sizing: border-box; }
        section { margin-bottom: 2.5rem; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1rem; }
        .card { background: #ffffff; border: 1px solid #e2e8f0; border-radius: 12px; padding: 1.25rem; }
        .card.popular { border-color: #f59e0b; box-shadow: 0 0 0 2px rgba(245, 158, 11, 0.25); }
        .price { font-size: 1.4rem; font-weight: 700; color: #b45309; }
        table { width: 100%; border-collapse: collapse; margin-top: 1rem; background: #ffffff; }
        th, td { padding: 0.65rem 0.85rem; border-bottom: 1px solid #e2e8f0; text-align: left; font-size: 0.95rem; }
        th { background: #f1f5f9; font-weight: 600; }
        .note { color: #475569; font-size: 0.95rem; line-height: 1.6; }
        .status-tag { display: inline-block; padding: 0.2rem 0.65rem; border-radius: 999px; font-size: 0.8rem; font-weight: 600; }
        .status-tag.active { background: #dcfce7; color: #166534; }
        .status-tag.expired { background: #fee2e2; color: #b91c1c; }
        .status-tag.not_required { background: #e2e8f0; color: #334155; }
        .flash { padding: 0.85rem 1rem; border-radius: 10px; margin-bottom: 1.5rem; }
        .flash.error { background: #fee2e2; color: #b91c1c; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
        @media (max-width: 768px) {
            main { padding: 1.5rem 1rem; }
            th, td { padding: 0.5rem; }
        }
"#;

pub struct NavLink<'a> {
    pub href: &'a str,
    pub label: &'a str,
}

pub const PUBLIC_NAV: &[NavLink<'static>] = &[
    NavLink {
        href: "/",
        label: "Главная",
    },
    NavLink {
        href: "/documents",
        label: "Документы",
    },
];

pub const ADMIN_NAV: &[NavLink<'static>] = &[
    NavLink {
        href: "/",
        label: "На сайт",
    },
    NavLink {
        href: "/admin",
        label: "Панель управления",
    },
];

pub struct PageLayout<'a> {
    pub meta_title: &'a str,
    pub page_heading: &'a str,
    pub nav: &'a [NavLink<'a>],
    pub body_html: String,
    pub indexable: bool,
}

pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        meta_title,
        page_heading,
        nav,
        body_html,
        indexable,
    } = layout;

    let nav_html = nav
        .iter()
        .map(|link| format!(r#"<a href="{}">{}</a>"#, link.href, link.label))
        .collect::<Vec<_>>()
        .join("");
    let robots = if indexable {
        "index,follow"
    } else {
        "noindex,nofollow"
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="{robots}">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <div class="header-bar">
            <h1>{page_heading}</h1>
            <nav>{nav_html}</nav>
        </div>
    </header>
    <main>
{body_html}
        {footer}
    </main>
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        page_heading = escape_html(page_heading),
        styles = PAGE_BASE_STYLES,
        footer = render_footer(),
    )
}

pub fn render_login_page(error: Option<&str>) -> String {
    let flash = error
        .map(|message| format!(r#"<div class="flash error">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    render_page(PageLayout {
        meta_title: "Вход в панель управления | РУЛЬ+",
        page_heading: "Вход в панель управления",
        nav: PUBLIC_NAV,
        body_html: format!(
            r#"        <section class="panel" style="max-width:420px;margin:0 auto;">
            {flash}
            <form method="post" action="/admin/login">
                <label for="username">Логин</label>
                <input id="username" name="username" required>
                <label for="password">Пароль</label>
                <input id="password" type="password" name="password" required>
                <button type="submit">Войти</button>
            </form>
        </section>"#
        ),
        indexable: false,
    })
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© 2015-{current_year} Автошкола РУЛЬ+</footer>"#
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `45000` → `45 000 ₽`.
pub fn format_rubles(amount: u32) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + 4);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{grouped} ₽")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'Устав' & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;Устав&#39; &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn rubles_are_grouped_by_thousands() {
        assert_eq!(format_rubles(900), "900 ₽");
        assert_eq!(format_rubles(45_000), "45 000 ₽");
        assert_eq!(format_rubles(1_250_000), "1 250 000 ₽");
    }

    #[test]
    fn login_page_shows_error_flash() {
        let html = render_login_page(Some("Неверный логин или пароль"));
        assert!(html.contains("flash error"));
        assert!(html.contains(r#"action="/admin/login""#));
    }
}
