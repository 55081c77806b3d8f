use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::models::DependencyRecord;

/// Analyzer for JVM projects built with Maven or Gradle.
///
/// `pom.xml` yields `maven` records; `build.gradle`, `build.gradle.kts` and
/// `gradle.lockfile` yield `gradle` records. Names keep Maven coordinates
/// (`group:artifact`) so rules can target either part. Deduplicated by
/// `ecosystem:group:artifact`.
pub struct JavaAnalyzer;

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl super::Analyzer for JavaAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<DependencyRecord>> {
        let mut records: Vec<DependencyRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let sources: [(&str, fn(&Path) -> Result<Vec<DependencyRecord>>); 4] = [
            ("pom.xml", parse_pom_xml),
            ("build.gradle", parse_build_gradle),
            ("build.gradle.kts", parse_build_gradle),
            ("gradle.lockfile", parse_gradle_lockfile),
        ];

        for (file, parse) in sources {
            let manifest = path.join(file);
            if !manifest.exists() {
                continue;
            }
            match parse(&manifest) {
                Ok(parsed) => {
                    for r in parsed {
                        let key = format!(
                            "{}:{}",
                            r.ecosystem.as_deref().unwrap_or_default(),
                            r.name.as_deref().unwrap_or_default()
                        );
                        if seen.insert(key) {
                            records.push(r);
                        }
                    }
                }
                Err(err) => tracing::warn!("skipping {}: {err:#}", manifest.display()),
            }
        }

        Ok(records)
    }
}

fn coordinates(group_id: &str, artifact_id: &str) -> String {
    if group_id.is_empty() {
        artifact_id.to_string()
    } else {
        format!("{}:{}", group_id, artifact_id)
    }
}

/// Parse `pom.xml` with the quick-xml event API.
fn parse_pom_xml(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    let mut in_dependency = false;
    let mut in_exclusions = false;
    let mut current_tag = String::new();
    let mut group_id = String::new();
    let mut artifact_id = String::new();
    let mut version = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if name == "exclusions" {
                    in_exclusions = true;
                } else if name == "dependency" && !in_exclusions {
                    in_dependency = true;
                    group_id.clear();
                    artifact_id.clear();
                    version.clear();
                }
                current_tag = name;
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if name == "exclusions" {
                    in_exclusions = false;
                } else if name == "dependency" && in_dependency {
                    if !artifact_id.is_empty() {
                        let v = if version.is_empty() { "*" } else { version.as_str() };
                        records.push(super::record(
                            coordinates(&group_id, &artifact_id),
                            v,
                            "maven",
                            "pom.xml",
                        ));
                    }
                    in_dependency = false;
                }
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) if in_dependency && !in_exclusions => {
                let text = e.unescape().unwrap_or_default();
                match current_tag.as_str() {
                    "groupId" => group_id = text.to_string(),
                    "artifactId" => artifact_id = text.to_string(),
                    "version" => version = text.to_string(),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Parse `build.gradle` / `build.gradle.kts` dependency declarations.
fn parse_build_gradle(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let manifest = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("build.gradle");
    let mut records = Vec::new();

    // implementation 'group:artifact:version' / implementation("group:artifact")
    let re_shorthand = Regex::new(
        r#"(?:implementation|api|compileOnly|runtimeOnly|testImplementation|testRuntimeOnly|annotationProcessor|kapt)\s*\(?\s*['"]([^'":]+):([^'":]+)(?::([^'"]+))?['"]"#,
    )?;

    for caps in re_shorthand.captures_iter(&content) {
        let version = caps.get(3).map_or("*", |m| m.as_str());
        records.push(super::record(
            coordinates(&caps[1], &caps[2]),
            version,
            "gradle",
            manifest,
        ));
    }

    // implementation group: 'com.example', name: 'foo', version: '1.0'
    let re_map = Regex::new(
        r#"(?:implementation|api|compileOnly|runtimeOnly|testImplementation)\s+group:\s*['"]([^'"]+)['"]\s*,\s*name:\s*['"]([^'"]+)['"](?:\s*,\s*version:\s*['"]([^'"]+)['"])?"#,
    )?;

    for caps in re_map.captures_iter(&content) {
        let version = caps.get(3).map_or("*", |m| m.as_str());
        records.push(super::record(
            coordinates(&caps[1], &caps[2]),
            version,
            "gradle",
            manifest,
        ));
    }

    Ok(records)
}

/// Parse `gradle.lockfile` — lines of `group:artifact:version=configurations`.
fn parse_gradle_lockfile(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let re = Regex::new(r"^([^:]+):([^:]+):([^=\s]+)")?;
    let mut records = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("empty=") {
            continue;
        }
        if let Some(caps) = re.captures(line) {
            records.push(super::record(
                coordinates(&caps[1], &caps[2]),
                &caps[3],
                "gradle",
                "gradle.lockfile",
            ));
        }
    }

    Ok(records)
}
