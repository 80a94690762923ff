use regex::Regex;

lazy_static::lazy_static! {
    static ref SEPARATOR_REGEX: Regex = Regex::new(r"[-_.\s]+").unwrap();
    static ref VERSION_TOKEN_REGEX: Regex = Regex::new(r"^v?[0-9]+$").unwrap();
}

/// Whole tokens dropped from a file name. `x86_64` splits into `x86` + `64`.
const PLATFORM_TOKENS: &[&str] = &[
    "x86", "amd64", "aarch64", "arm64", "armhf", "i386", "i686", "linux", "setup",
];

/// Derives an app id from an executable's file name, e.g.
/// `Krita-5.2.2-x86_64.AppImage` becomes `krita`.
///
/// Only whole separator-delimited tokens are removed, so `Setuptools` stays
/// `setuptools`.
pub fn suggest_app_id(file_name: &str) -> String {
    let lower = file_name.trim().to_lowercase();
    let stem = lower
        .strip_suffix(".appimage")
        .or_else(|| lower.strip_suffix("_appimage"))
        .unwrap_or(lower.as_str());

    SEPARATOR_REGEX
        .split(stem)
        .filter(|token| !token.is_empty())
        .filter(|token| !PLATFORM_TOKENS.contains(token))
        .filter(|token| !VERSION_TOKEN_REGEX.is_match(token))
        .collect::<Vec<_>>()
        .join("-")
}

/// Turns a suggested id back into a display name: `my-tool` -> `My Tool`.
pub fn suggest_app_name(app_id: &str) -> String {
    app_id
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_removes_version() {
        assert_eq!(suggest_app_id("Obsidian-1.4.16.AppImage"), "obsidian");
        assert_eq!(suggest_app_id("TestApp-v1.2.3"), "testapp");
        assert_eq!(suggest_app_id("TestApp-v2"), "testapp");
    }

    #[test]
    fn suggest_removes_architecture() {
        assert_eq!(suggest_app_id("Krita-5.2.2-x86_64.AppImage"), "krita");
        assert_eq!(suggest_app_id("TestApp-amd64"), "testapp");
        assert_eq!(suggest_app_id("TestApp-aarch64"), "testapp");
    }

    #[test]
    fn suggest_normalizes_separators() {
        assert_eq!(suggest_app_id("My_Tool"), "my-tool");
        assert_eq!(suggest_app_id("My--Tool___v1.0.AppImage"), "my-tool");
        assert_eq!(suggest_app_id("my tool"), "my-tool");
    }

    #[test]
    fn suggest_keeps_words_that_merely_contain_platform_names() {
        assert_eq!(suggest_app_id("Setuptools.AppImage"), "setuptools");
        assert_eq!(suggest_app_id("linuxdeploy-x86_64.AppImage"), "linuxdeploy");
        assert_eq!(suggest_app_id("0ad-0.0.26-linux-x86_64.AppImage"), "0ad");
    }

    #[test]
    fn suggest_handles_empty_input() {
        assert_eq!(suggest_app_id(""), "");
        assert_eq!(suggest_app_id("  "), "");
    }

    #[test]
    fn suggest_app_name_title_cases_words() {
        assert_eq!(suggest_app_name("my-tool"), "My Tool");
        assert_eq!(suggest_app_name("krita"), "Krita");
        assert_eq!(suggest_app_name(""), "");
    }
}
