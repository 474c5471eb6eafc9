use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::{
    modules::{
        documents::{Document, DocumentStats},
        school::{Application, Student},
    },
    web::{
        AppState,
        templates::{ADMIN_NAV, PageLayout, escape_html, render_page},
    },
};

use super::{auth::require_admin, stats::QuickStats};

const RECENT_APPLICATIONS: usize = 10;

pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Err(redirect) = require_admin(&jar) {
        return redirect.into_response();
    }

    let documents = match state.documents().list().await {
        Ok(documents) => documents,
        Err(err) => {
            error!(?err, "failed to load documents for dashboard");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Ошибка сервера</h1><p>Попробуйте позже.</p>".to_string()),
            )
                .into_response();
        }
    };

    let (main_count, additional_count, discount_count) = {
        let catalog = state.catalog().read().await;
        (
            catalog.main_services.len(),
            catalog.additional_services.len(),
            catalog.discounts.len(),
        )
    };
    let (applications, students) = {
        let school = state.school().read().await;
        let recent: Vec<Application> = school
            .applications
            .iter()
            .rev()
            .take(RECENT_APPLICATIONS)
            .cloned()
            .collect();
        (recent, school.students.clone())
    };

    let stats = DocumentStats::from_documents(&documents);
    let quick = QuickStats::with_document_count(stats.total);

    let body_html = format!(
        r#"        <section class="cards">
            <div class="card"><h3>Ученики</h3><p class="price">{students}</p></div>
            <div class="card"><h3>Заявки</h3><p class="price">{applications}</p></div>
            <div class="card"><h3>Конверсия</h3><p class="price">{conversion:.1}%</p></div>
            <div class="card"><h3>Документы</h3><p class="price">{documents}</p><p class="note">действуют: {active}, истекли: {expired}</p></div>
        </section>
        <section class="panel">
            <h2>Документы</h2>
            <table>
                <thead><tr><th>Название</th><th>Категория</th><th>Статус</th><th>Файл</th><th>Обновлён</th></tr></thead>
                <tbody>{document_rows}</tbody>
            </table>
        </section>
        <section class="panel">
            <h2>Услуги</h2>
            <p class="note">Основных программ: {main_count}. Дополнительных услуг: {additional_count}. Скидок: {discount_count}.</p>
        </section>
        <section class="panel">
            <h2>Ученики</h2>
            <table>
                <thead><tr><th>ФИО</th><th>Категория</th><th>Группа</th><th>Статус</th></tr></thead>
                <tbody>{student_rows}</tbody>
            </table>
        </section>
        <section class="panel">
            <h2>Последние заявки</h2>
            <table>
                <thead><tr><th>Имя</th><th>Телефон</th><th>Категория</th><th>Получена</th></tr></thead>
                <tbody>{application_rows}</tbody>
            </table>
        </section>
        <p><a href="/admin/logout">Выйти</a></p>"#,
        students = quick.students,
        applications = quick.applications,
        conversion = quick.conversion,
        documents = quick.documents,
        active = stats.active,
        expired = stats.expired,
        document_rows = render_document_rows(&documents),
        student_rows = render_student_rows(&students),
        application_rows = render_application_rows(&applications),
    );

    Html(render_page(PageLayout {
        meta_title: "Панель управления | РУЛЬ+",
        page_heading: "Панель управления",
        nav: ADMIN_NAV,
        body_html,
        indexable: false,
    }))
    .into_response()
}

fn render_document_rows(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "<tr><td colspan=\"5\">Документы ещё не загружены.</td></tr>".to_string();
    }

    documents
        .iter()
        .map(|doc| {
            let file_cell = match (&doc.file_url, &doc.file_name) {
                (Some(url), Some(name)) => format!(
                    r#"<a href="{url}" target="_blank">{name}</a> {size}"#,
                    url = escape_html(url),
                    name = escape_html(name),
                    size = escape_html(doc.file_size.as_deref().unwrap_or_default()),
                ),
                _ => "—".to_string(),
            };
            format!(
                r#"<tr><td>{title}</td><td>{category}</td><td><span class="status-tag {status_class}">{status}</span></td><td>{file_cell}</td><td>{updated}</td></tr>"#,
                title = escape_html(&doc.title),
                category = doc.category.label_ru(),
                status_class = doc.status.as_str(),
                status = doc.status.label_ru(),
                updated = doc.last_update.format("%d.%m.%Y %H:%M"),
            )
        })
        .collect()
}

fn render_student_rows(students: &[Student]) -> String {
    if students.is_empty() {
        return "<tr><td colspan=\"4\">Учеников нет.</td></tr>".to_string();
    }

    students
        .iter()
        .map(|student| {
            format!(
                "<tr><td>{name}</td><td>{category}</td><td>{group}</td><td>{status}</td></tr>",
                name = escape_html(&student.full_name),
                category = escape_html(&student.category),
                group = escape_html(student.group.as_deref().unwrap_or("—")),
                status = student.status.label_ru(),
            )
        })
        .collect()
}

fn render_application_rows(applications: &[Application]) -> String {
    if applications.is_empty() {
        return "<tr><td colspan=\"4\">Заявок пока нет.</td></tr>".to_string();
    }

    applications
        .iter()
        .map(|app| {
            format!(
                "<tr><td>{name}</td><td>{phone}</td><td>{category}</td><td>{at}</td></tr>",
                name = escape_html(&app.name),
                phone = escape_html(&app.phone),
                category = escape_html(app.category.as_deref().unwrap_or("—")),
                at = app.submitted_at.format("%d.%m.%Y %H:%M"),
            )
        })
        .collect()
}
