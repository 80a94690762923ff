use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid app id {0:?}: it must be a single directory name")]
    InvalidAppId(String),

    #[error("Field {0} must not contain line breaks")]
    LineBreak(&'static str),

    #[error("The {field} path {path:?} must end in a UTF-8 file name")]
    InvalidFileName { field: &'static str, path: PathBuf },
}

/// A validated description of one application to install.
///
/// Built through [`InstallRequestBuilder`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    app_id: String,
    app_name: String,
    executable: PathBuf,
    additional_files: Vec<PathBuf>,
    additional_files_dir: Option<PathBuf>,
    icon: Option<PathBuf>,
    comment: Option<String>,
    generic_name: Option<String>,
    categories: Vec<String>,
    keywords: Vec<String>,
    terminal: Option<bool>,
}

impl InstallRequest {
    pub fn builder() -> InstallRequestBuilder {
        InstallRequestBuilder::default()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn additional_files(&self) -> &[PathBuf] {
        &self.additional_files
    }

    pub fn additional_files_dir(&self) -> Option<&Path> {
        self.additional_files_dir.as_deref()
    }

    pub fn icon(&self) -> Option<&Path> {
        self.icon.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn generic_name(&self) -> Option<&str> {
        self.generic_name.as_deref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn terminal(&self) -> Option<bool> {
        self.terminal
    }
}

/// Mutable form state owned by a single front-end session.
///
/// Empty lists are treated the same as absent ones: no `Categories=` or
/// `Keywords=` line is rendered for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequestBuilder {
    pub app_id: Option<String>,
    pub app_name: Option<String>,
    pub executable: Option<PathBuf>,
    pub additional_files: Vec<PathBuf>,
    pub additional_files_dir: Option<PathBuf>,
    pub icon: Option<PathBuf>,
    pub comment: Option<String>,
    pub generic_name: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub terminal: Option<bool>,
}

impl InstallRequestBuilder {
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn additional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.additional_files.push(path.into());
        self
    }

    pub fn additional_files_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.additional_files_dir = Some(path.into());
        self
    }

    pub fn icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.icon = Some(path.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn generic_name(mut self, generic_name: impl Into<String>) -> Self {
        self.generic_name = Some(generic_name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn terminal(mut self, terminal: Option<bool>) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn build(&self) -> Result<InstallRequest, RequestError> {
        let app_id = required(&self.app_id, "app id")?;
        let app_name = required(&self.app_name, "app name")?;
        let executable = self
            .executable
            .clone()
            .ok_or(RequestError::MissingField("executable"))?;

        validate_app_id(&app_id)?;

        // Exec= and Icon= are written as text, so their names must survive as-is.
        utf8_file_name("executable", &executable)?;
        if let Some(icon) = &self.icon {
            utf8_file_name("icon", icon)?;
        }
        for file in &self.additional_files {
            if file.file_name().is_none() {
                return Err(RequestError::InvalidFileName {
                    field: "additional file",
                    path: file.clone(),
                });
            }
        }

        // Every value below ends up on its own `Key=value` line.
        reject_line_breaks("app id", &app_id)?;
        reject_line_breaks("app name", &app_name)?;
        reject_line_breaks("executable", &executable.to_string_lossy())?;
        if let Some(icon) = &self.icon {
            reject_line_breaks("icon", &icon.to_string_lossy())?;
        }
        if let Some(comment) = &self.comment {
            reject_line_breaks("comment", comment)?;
        }
        if let Some(generic_name) = &self.generic_name {
            reject_line_breaks("generic name", generic_name)?;
        }
        for category in &self.categories {
            reject_line_breaks("categories", category)?;
        }
        for keyword in &self.keywords {
            reject_line_breaks("keywords", keyword)?;
        }

        Ok(InstallRequest {
            app_id,
            app_name,
            executable,
            additional_files: self.additional_files.clone(),
            additional_files_dir: self.additional_files_dir.clone(),
            icon: self.icon.clone(),
            comment: self.comment.clone(),
            generic_name: self.generic_name.clone(),
            categories: self.categories.clone(),
            keywords: self.keywords.clone(),
            terminal: self.terminal,
        })
    }
}

/// Parses the tri-state terminal flag: `true`/`false`/`1`/`0`, any case.
pub fn parse_terminal(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!(
            "invalid terminal value {other:?}, expected true, false, 1 or 0"
        )),
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, RequestError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(RequestError::MissingField(field)),
    }
}

fn validate_app_id(app_id: &str) -> Result<(), RequestError> {
    if app_id == "." || app_id == ".." || app_id.contains(['/', '\\', '\0']) {
        return Err(RequestError::InvalidAppId(app_id.to_string()));
    }
    Ok(())
}

fn utf8_file_name(field: &'static str, path: &Path) -> Result<(), RequestError> {
    match path.file_name().and_then(|name| name.to_str()) {
        Some(_) => Ok(()),
        None => Err(RequestError::InvalidFileName {
            field,
            path: path.to_path_buf(),
        }),
    }
}

fn reject_line_breaks(field: &'static str, value: &str) -> Result<(), RequestError> {
    if value.contains(['\n', '\r']) {
        return Err(RequestError::LineBreak(field));
    }
    Ok(())
}
