use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::{
    modules::{
        documents::{DocumentCategory, group_by_category},
        school::{BasicInfo, StaffMember},
        services::MainService,
    },
    web::{
        AppState,
        templates::{PUBLIC_NAV, PageLayout, escape_html, format_rubles, render_page},
    },
};

pub async fn landing_page(State(state): State<AppState>) -> Html<String> {
    let (info, staff) = {
        let school = state.school().read().await;
        (school.basic_info.clone(), school.staff.clone())
    };
    let services = state.catalog().read().await.main_services.clone();

    let body_html = format!(
        "{about}\n{services}\n{staff}",
        about = render_about(&info),
        services = render_services(&services),
        staff = render_staff(&staff),
    );

    Html(render_page(PageLayout {
        meta_title: &info.name,
        page_heading: &info.name,
        nav: PUBLIC_NAV,
        body_html,
        indexable: true,
    }))
}

pub async fn documents_page(State(state): State<AppState>) -> Response {
    let documents = match state.documents().list().await {
        Ok(documents) => documents,
        Err(err) => {
            error!(?err, "failed to load documents for public page");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Ошибка сервера</h1><p>Попробуйте позже.</p>".to_string()),
            )
                .into_response();
        }
    };

    let grouped = group_by_category(documents);
    let mut body_html = String::new();
    for category in DocumentCategory::ALL {
        let docs = grouped
            .get(category.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let items = if docs.is_empty() {
            r#"<p class="note">Документы этого раздела пока не опубликованы.</p>"#.to_string()
        } else {
            let rows: String = docs
                .iter()
                .map(|doc| {
                    let link = doc
                        .file_url
                        .as_deref()
                        .map(|url| {
                            format!(
                                r#"<a href="{url}" target="_blank">Открыть</a> · <a href="{url}?download=1">Скачать</a>"#,
                                url = escape_html(url)
                            )
                        })
                        .unwrap_or_default();
                    format!(
                        r#"<tr><td>{title}<div class="note">{description}</div></td><td><span class="status-tag {status_class}">{status}</span></td><td>{link}</td></tr>"#,
                        title = escape_html(&doc.title),
                        description = escape_html(&doc.description),
                        status_class = doc.status.as_str(),
                        status = doc.status.label_ru(),
                    )
                })
                .collect();
            format!("<table><tbody>{rows}</tbody></table>")
        };
        body_html.push_str(&format!(
            r#"        <section class="panel" id="{slug}">
            <h2>{label}</h2>
            {items}
        </section>
"#,
            slug = category.as_str(),
            label = category.label_ru(),
        ));
    }

    Html(render_page(PageLayout {
        meta_title: "Сведения об образовательной организации | РУЛЬ+",
        page_heading: "Документы",
        nav: PUBLIC_NAV,
        body_html,
        indexable: true,
    }))
    .into_response()
}

fn render_about(info: &BasicInfo) -> String {
    let phones = info
        .phones
        .iter()
        .map(|phone| escape_html(phone))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"        <section class="panel">
            <h2>{slogan}</h2>
            <p class="note">{address}<br>{phones}<br>{email}<br>{hours}</p>
            <p class="note">Лицензия № {license}</p>
        </section>"#,
        slogan = escape_html(&info.slogan),
        address = escape_html(&info.address),
        email = escape_html(&info.email),
        hours = escape_html(&info.working_hours),
        license = escape_html(&info.license_number),
    )
}

fn render_services(services: &[MainService]) -> String {
    let cards: String = services
        .iter()
        .map(|service| {
            let features: String = service
                .features
                .iter()
                .map(|feature| format!("<li>{}</li>", escape_html(feature)))
                .collect();
            format!(
                r#"<div class="card{popular}"><h3>{name}</h3><p class="price">{price}</p><p class="note">{description}</p><ul>{features}</ul></div>"#,
                popular = if service.popular { " popular" } else { "" },
                name = escape_html(&service.name),
                price = format_rubles(service.price),
                description = escape_html(&service.description),
            )
        })
        .collect();
    format!(
        r#"        <section>
            <h2>Обучение</h2>
            <div class="cards">{cards}</div>
        </section>"#
    )
}

fn render_staff(staff: &[StaffMember]) -> String {
    let cards: String = staff
        .iter()
        .map(|member| {
            format!(
                r#"<div class="card"><h3>{name}</h3><p>{position}</p><p class="note">{experience}</p></div>"#,
                name = escape_html(&member.name),
                position = escape_html(&member.position),
                experience = escape_html(&member.experience),
            )
        })
        .collect();
    format!(
        r#"        <section>
            <h2>Наша команда</h2>
            <div class="cards">{cards}</div>
        </section>"#
    )
}
