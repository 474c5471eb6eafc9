use std::{env, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_PUBLIC_DOCUMENTS_DIR: &str = "public/documents";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Runtime settings resolved from the process environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub cors_origin: Option<String>,
    pub upload_dir: PathBuf,
    pub public_documents_dir: PathBuf,
    pub admin: AdminCredentials,
    pub application_recipient: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username.trim() && self.password == password
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match non_empty_var("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            database_url: non_empty_var("DATABASE_URL"),
            cors_origin: non_empty_var("CORS_ORIGIN"),
            upload_dir: non_empty_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            public_documents_dir: non_empty_var("PUBLIC_DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DOCUMENTS_DIR)),
            admin: AdminCredentials {
                username: non_empty_var("ADMIN_USERNAME")
                    .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
                password: non_empty_var("ADMIN_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            },
            application_recipient: non_empty_var("EMAIL_TO"),
        })
    }

    /// Directory holding uploaded document files.
    pub fn document_upload_dir(&self) -> PathBuf {
        self.upload_dir.join("documents")
    }

    /// Configuration rooted in a scratch directory with the in-memory store.
    #[cfg(test)]
    pub fn for_tests(root: &std::path::Path) -> Self {
        Self {
            port: 0,
            database_url: None,
            cors_origin: None,
            upload_dir: root.join("uploads"),
            public_documents_dir: root.join("public/documents"),
            admin: AdminCredentials {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                password: DEFAULT_ADMIN_PASSWORD.to_string(),
            },
            application_recipient: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_compare_trimmed_username_and_exact_password() {
        let creds = AdminCredentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };

        assert!(creds.matches(" admin ", "secret"));
        assert!(!creds.matches("admin", "secret "));
        assert!(!creds.matches("root", "secret"));
    }

    #[test]
    fn upload_dir_nests_documents() {
        let config = AppConfig::for_tests(std::path::Path::new("/tmp/rul"));
        assert_eq!(
            config.document_upload_dir(),
            PathBuf::from("/tmp/rul/uploads/documents")
        );
    }
}
