use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::records::record_ids;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub name: String,
    #[serde(default)]
    pub slogan: String,
    pub address: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub working_hours: String,
    #[serde(default)]
    pub license_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: u64,
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    #[default]
    Studying,
    ExamPending,
    Graduated,
    Expelled,
}

impl StudentStatus {
    pub fn label_ru(&self) -> &'static str {
        match self {
            StudentStatus::Studying => "Обучается",
            StudentStatus::ExamPending => "Сдаёт экзамен",
            StudentStatus::Graduated => "Выпускник",
            StudentStatus::Expelled => "Отчислен",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: u64,
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub category: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub category: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Body of `POST /api/applications/submit` as sent by the public contact form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

record_ids!(StaffMember, Student);

/// Applications kept in memory; the oldest are dropped past this.
pub const MAX_STORED_APPLICATIONS: usize = 500;

/// People and contact data shown on public pages and edited from the admin panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolDirectory {
    pub basic_info: BasicInfo,
    pub staff: Vec<StaffMember>,
    pub students: Vec<Student>,
    pub applications: VecDeque<Application>,
}

impl SchoolDirectory {
    pub fn seed() -> Self {
        Self {
            basic_info: BasicInfo {
                name: "Автошкола РУЛЬ+".to_string(),
                slogan: "Учим водить уверенно".to_string(),
                address: "г. Москва, ул. Примерная, д. 1".to_string(),
                phones: vec!["+7 (900) 000-00-00".to_string()],
                email: "info@rulplus.ru".to_string(),
                working_hours: "Пн–Пт 9:00–20:00, Сб 10:00–16:00".to_string(),
                license_number: "Л035-00000-77/00000000".to_string(),
            },
            staff: vec![
                StaffMember {
                    id: 1,
                    name: "Иванов Сергей Петрович".to_string(),
                    position: "Директор".to_string(),
                    experience: "20 лет".to_string(),
                    description: "Руководит автошколой с момента основания".to_string(),
                    categories: Vec::new(),
                    photo_url: None,
                },
                StaffMember {
                    id: 2,
                    name: "Петрова Анна Викторовна".to_string(),
                    position: "Преподаватель теории".to_string(),
                    experience: "12 лет".to_string(),
                    description: "ПДД, основы безопасного управления".to_string(),
                    categories: vec!["A".to_string(), "B".to_string()],
                    photo_url: None,
                },
                StaffMember {
                    id: 3,
                    name: "Смирнов Алексей Игоревич".to_string(),
                    position: "Мастер производственного обучения".to_string(),
                    experience: "8 лет".to_string(),
                    description: "Практическое вождение, подготовка к экзамену".to_string(),
                    categories: vec!["B".to_string()],
                    photo_url: None,
                },
            ],
            students: vec![Student {
                id: 1,
                full_name: "Кузнецова Мария Андреевна".to_string(),
                phone: "+7 (900) 111-22-33".to_string(),
                email: None,
                category: "B".to_string(),
                group: Some("B-12".to_string()),
                status: StudentStatus::Studying,
                enrollment_date: NaiveDate::from_ymd_opt(2024, 9, 2),
            }],
            applications: VecDeque::new(),
        }
    }

    /// Stores a submitted application; `Err` carries the reason it was refused.
    pub fn submit_application(
        &mut self,
        form: ApplicationForm,
        now: DateTime<Utc>,
    ) -> Result<Application, &'static str> {
        let name = form.name.trim();
        let phone = form.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err("Укажите имя и телефон");
        }

        let next_id = self.applications.back().map_or(0, |last| last.id) + 1;
        let application = Application {
            id: next_id,
            name: name.to_string(),
            phone: phone.to_string(),
            email: non_blank(form.email),
            category: non_blank(form.category),
            message: non_blank(form.message),
            submitted_at: now,
        };
        if self.applications.len() == MAX_STORED_APPLICATIONS {
            self.applications.pop_front();
        }
        self.applications.push_back(application.clone());
        Ok(application)
    }

    /// Applications, newest first.
    pub fn recent_applications(&self) -> Vec<Application> {
        self.applications.iter().rev().cloned().collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_requires_name_and_phone() {
        let mut directory = SchoolDirectory::seed();
        let form = ApplicationForm {
            name: "Олег".to_string(),
            phone: "   ".to_string(),
            ..Default::default()
        };
        assert!(directory.submit_application(form, Utc::now()).is_err());
        assert!(directory.applications.is_empty());
    }

    #[test]
    fn application_store_keeps_only_the_newest() {
        let mut directory = SchoolDirectory::seed();
        for n in 0..MAX_STORED_APPLICATIONS + 3 {
            directory
                .submit_application(
                    ApplicationForm {
                        name: format!("Заявитель {n}"),
                        phone: "+7 900".to_string(),
                        ..Default::default()
                    },
                    Utc::now(),
                )
                .unwrap();
        }

        assert_eq!(directory.applications.len(), MAX_STORED_APPLICATIONS);
        let recent = directory.recent_applications();
        assert_eq!(recent[0].id, (MAX_STORED_APPLICATIONS + 3) as u64);
        assert_eq!(recent.last().map(|a| a.id), Some(4));
    }

    #[test]
    fn applications_are_listed_newest_first() {
        let mut directory = SchoolDirectory::seed();
        let earlier = Utc::now() - chrono::Duration::minutes(5);
        for (name, at) in [("Первый", earlier), ("Второй", Utc::now())] {
            directory
                .submit_application(
                    ApplicationForm {
                        name: name.to_string(),
                        phone: "+7 900".to_string(),
                        email: Some("  ".to_string()),
                        ..Default::default()
                    },
                    at,
                )
                .unwrap();
        }

        let recent = directory.recent_applications();
        assert_eq!(recent[0].name, "Второй");
        assert_eq!(recent[1].id, 1);
        assert_eq!(recent[1].email, None);
    }
}
