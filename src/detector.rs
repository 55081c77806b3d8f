use std::path::Path;

use crate::models::Language;

const MANIFESTS: &[(Language, &[&str])] = &[
    (
        Language::Python,
        &["requirements.txt", "pyproject.toml", "Pipfile.lock"],
    ),
    (
        Language::JavaScript,
        &["package.json", "package-lock.json", "yarn.lock"],
    ),
    (
        Language::Java,
        &["pom.xml", "build.gradle", "build.gradle.kts", "gradle.lockfile"],
    ),
    (Language::Go, &["go.mod"]),
    (Language::Rust, &["Cargo.lock"]),
];

/// Languages whose manifests are present directly under `path`.
pub fn detect_languages(path: &Path) -> Vec<Language> {
    MANIFESTS
        .iter()
        .filter(|(_, files)| files.iter().any(|f| path.join(f).exists()))
        .map(|(language, _)| *language)
        .collect()
}
