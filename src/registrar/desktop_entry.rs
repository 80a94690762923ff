use std::path::Path;

use crate::core::InstallRequest;

/// The `[Desktop Entry]` group written for an installed application.
///
/// Values are emitted verbatim, without desktop-entry escaping. Line breaks
/// are rejected earlier, when the request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: String,
    pub generic_name: Option<String>,
    pub exec_path: String,
    pub icon_path: Option<String>,
    pub comment: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub terminal: Option<bool>,
}

impl DesktopEntry {
    /// Entry for `request` pointing at the installed copies, not the sources.
    pub fn for_request(request: &InstallRequest, exec_path: &Path, icon_path: Option<&Path>) -> Self {
        DesktopEntry {
            name: request.app_name().to_string(),
            generic_name: request.generic_name().map(str::to_string),
            exec_path: exec_path.display().to_string(),
            icon_path: icon_path.map(|p| p.display().to_string()),
            comment: request.comment().map(str::to_string),
            categories: request.categories().to_vec(),
            keywords: request.keywords().to_vec(),
            terminal: request.terminal(),
        }
    }

    pub fn to_file_content(&self) -> String {
        let mut content = String::from("[Desktop Entry]\n\n");

        content.push_str("Type=Application\n");
        content.push_str(&format!("Name={}\n", self.name));
        if let Some(generic_name) = &self.generic_name {
            content.push_str(&format!("GenericName={}\n", generic_name));
        }
        content.push_str(&format!("Exec={}\n", self.exec_path));
        if let Some(icon) = &self.icon_path {
            content.push_str(&format!("Icon={}\n", icon));
        }
        if let Some(comment) = &self.comment {
            content.push_str(&format!("Comment={}\n", comment));
        }
        if !self.categories.is_empty() {
            content.push_str(&format!("Categories={}\n", self.categories.join(";")));
        }
        if !self.keywords.is_empty() {
            content.push_str(&format!("Keywords={}\n", self.keywords.join(";")));
        }
        if let Some(terminal) = self.terminal {
            content.push_str(if terminal { "Terminal=True\n" } else { "Terminal=False\n" });
        }

        content
    }

    /// Reads back the keys this crate writes. Unknown keys, comments and
    /// other groups are ignored.
    pub fn parse(content: &str) -> Self {
        let mut entry = DesktopEntry::default();
        let mut in_entry_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('[') {
                in_entry_group = line == "[Desktop Entry]";
                continue;
            }
            if !in_entry_group || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.to_string();

            match key.trim() {
                "Name" => entry.name = value,
                "GenericName" => entry.generic_name = Some(value),
                "Exec" => entry.exec_path = value,
                "Icon" => entry.icon_path = Some(value),
                "Comment" => entry.comment = Some(value),
                "Categories" => entry.categories = split_list(&value),
                "Keywords" => entry.keywords = split_list(&value),
                "Terminal" => {
                    entry.terminal = if value.eq_ignore_ascii_case("true") {
                        Some(true)
                    } else if value.eq_ignore_ascii_case("false") {
                        Some(false)
                    } else {
                        None
                    }
                }
                _ => {}
            }
        }

        entry
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
