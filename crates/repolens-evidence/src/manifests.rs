//! Dependency manifest parsers.
//!
//! Each parser degrades on malformed input: whatever sub-parse succeeds is
//! kept and a best-effort regex or line scan covers the rest. Nothing here
//! fails.

use once_cell::sync::Lazy;
use regex::Regex;
use repolens_utils::paths::basename;
use tracing::debug;

use crate::normalize::requirement_name;

static SETUP_INSTALL_REQUIRES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)install_requires\s*=\s*\[(?P<body>.*?)\]").unwrap());

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

static POM_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<artifactId>([^<]+)</artifactId>").unwrap());

static PYPROJECT_PROJECT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)\[project\](?P<body>.*?)(?:\n\[|\z)").unwrap());

static PYPROJECT_DEPENDENCY_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)dependencies\s*=\s*\[(?P<deps>.*?)\]").unwrap());

static POETRY_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)\[tool\.poetry\.dependencies\](?P<body>.*?)(?:\n\[|\z)").unwrap()
});

/// Candidates and presence signals gathered from manifest files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFindings {
    pub candidates: Vec<String>,
    pub signals: Vec<String>,
}

impl ManifestFindings {
    fn candidate(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.candidates.push(name);
        }
    }

    fn signal(&mut self, file_name: &str) {
        self.signals.push(format!("{file_name} present"));
    }
}

/// Recognized manifest kinds, keyed by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Requirements,
    PackageJson,
    Pyproject,
    SetupPy,
    SetupCfg,
    GoMod,
    CargoToml,
    PomXml,
    Dockerfile,
    DockerCompose,
    TsConfig,
}

impl ManifestKind {
    /// Kind of the manifest at `path`, if its file name is recognized.
    #[must_use]
    pub fn detect(path: &str) -> Option<Self> {
        let name = basename(path);
        let kind = match name {
            "requirements.txt" => Self::Requirements,
            "package.json" => Self::PackageJson,
            "pyproject.toml" => Self::Pyproject,
            "setup.py" => Self::SetupPy,
            "setup.cfg" => Self::SetupCfg,
            "go.mod" => Self::GoMod,
            "Cargo.toml" => Self::CargoToml,
            "pom.xml" => Self::PomXml,
            "docker-compose.yml" | "docker-compose.yaml" => Self::DockerCompose,
            "tsconfig.json" => Self::TsConfig,
            _ if name.eq_ignore_ascii_case("dockerfile") => Self::Dockerfile,
            _ => return None,
        };
        Some(kind)
    }
}

/// Parse one manifest into `findings`. Unrecognized files are ignored.
pub fn parse_manifest(path: &str, content: &str, findings: &mut ManifestFindings) {
    let Some(kind) = ManifestKind::detect(path) else {
        return;
    };
    let name = basename(path);
    match kind {
        ManifestKind::Requirements => parse_requirements(content, findings),
        ManifestKind::PackageJson => parse_package_json(content, findings),
        ManifestKind::Pyproject => parse_pyproject(content, findings),
        ManifestKind::SetupPy => {
            findings.signal(name);
            parse_setup_py(content, findings);
        }
        ManifestKind::SetupCfg => {
            findings.signal(name);
            parse_setup_cfg(content, findings);
        }
        ManifestKind::GoMod => parse_go_mod(content, findings),
        ManifestKind::CargoToml => parse_cargo_toml(content, findings),
        ManifestKind::PomXml => {
            for cap in POM_ARTIFACT.captures_iter(content) {
                findings.candidate(cap[1].trim());
            }
        }
        ManifestKind::Dockerfile => {
            findings.signal("Dockerfile");
            findings.candidate("Docker");
        }
        ManifestKind::DockerCompose => findings.signal(name),
        ManifestKind::TsConfig => findings.candidate("TypeScript"),
    }
}

fn parse_requirements(content: &str, findings: &mut ManifestFindings) {
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        findings.candidate(requirement_name(line));
    }
}

fn parse_package_json(content: &str, findings: &mut ManifestFindings) {
    let parsed: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "package.json is not valid JSON");
            findings.signal("package.json");
            return;
        }
    };
    for section in ["dependencies", "devDependencies", "peerDependencies"] {
        if let Some(deps) = parsed.get(section).and_then(serde_json::Value::as_object) {
            for name in deps.keys() {
                findings.candidate(name.trim());
            }
        }
    }
}

fn parse_pyproject(content: &str, findings: &mut ManifestFindings) {
    let table: toml::Table = match toml::from_str(content) {
        Ok(table) => table,
        Err(err) => {
            debug!(error = %err, "pyproject.toml did not parse, scanning text instead");
            findings.signal("pyproject.toml");
            pyproject_fallback(content, findings);
            return;
        }
    };

    if let Some(deps) = table
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(toml::Value::as_array)
    {
        for dep in deps.iter().filter_map(toml::Value::as_str) {
            findings.candidate(requirement_name(dep));
        }
    }

    if let Some(deps) = table
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(toml::Value::as_table)
    {
        for name in deps.keys().filter(|k| k.as_str() != "python") {
            findings.candidate(name.as_str());
        }
    }
}

fn pyproject_fallback(content: &str, findings: &mut ManifestFindings) {
    if let Some(block) = PYPROJECT_PROJECT_BLOCK.captures(content)
        && let Some(list) = PYPROJECT_DEPENDENCY_LIST.captures(&block["body"])
    {
        for dep in QUOTED.captures_iter(&list["deps"]) {
            findings.candidate(requirement_name(&dep[1]));
        }
    }

    if let Some(block) = POETRY_BLOCK.captures(content) {
        for line in block["body"].lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, _)) = line.split_once('=') else {
                continue;
            };
            let name = key.trim().trim_matches(['"', '\'']);
            if name != "python" {
                findings.candidate(name);
            }
        }
    }
}

fn parse_setup_py(content: &str, findings: &mut ManifestFindings) {
    if let Some(cap) = SETUP_INSTALL_REQUIRES.captures(content) {
        for dep in QUOTED.captures_iter(&cap["body"]) {
            findings.candidate(requirement_name(&dep[1]));
        }
    }
}

fn parse_setup_cfg(content: &str, findings: &mut ManifestFindings) {
    let mut in_options = false;
    let mut in_install_requires = false;
    for raw in content.lines() {
        let line = raw.trim();
        if line.starts_with('[') && line.ends_with(']') {
            in_options = line.eq_ignore_ascii_case("[options]");
            in_install_requires = false;
            continue;
        }
        if !in_options {
            continue;
        }
        if line.to_lowercase().starts_with("install_requires") {
            in_install_requires = true;
            if let Some((_, inline)) = line.split_once('=') {
                findings.candidate(requirement_name(inline));
            }
            continue;
        }
        if in_install_requires {
            let indented = raw.starts_with([' ', '\t']);
            if !indented || line.is_empty() {
                in_install_requires = false;
                continue;
            }
            findings.candidate(requirement_name(line));
        }
    }
}

fn parse_go_mod(content: &str, findings: &mut ManifestFindings) {
    let mut in_block = false;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line.starts_with("require (") {
            in_block = true;
            continue;
        }
        if in_block && line == ")" {
            in_block = false;
            continue;
        }
        let module = if let Some(rest) = line.strip_prefix("require ") {
            rest.split_whitespace().next()
        } else if in_block {
            let mut parts = line.split_whitespace();
            parts.next().filter(|_| parts.next().is_some())
        } else {
            None
        };
        if let Some(module) = module {
            findings.candidate(basename(module));
        }
    }
}

fn parse_cargo_toml(content: &str, findings: &mut ManifestFindings) {
    match toml::from_str::<toml::Table>(content) {
        Ok(table) => {
            if let Some(deps) = table.get("dependencies").and_then(toml::Value::as_table) {
                for name in deps.keys() {
                    findings.candidate(name.as_str());
                }
            }
        }
        Err(err) => {
            debug!(error = %err, "Cargo.toml did not parse, scanning lines instead");
            let mut in_dependencies = false;
            for line in content.lines().map(str::trim) {
                if line.starts_with('[') && line.ends_with(']') {
                    in_dependencies = line == "[dependencies]";
                    continue;
                }
                if in_dependencies && let Some((key, _)) = line.split_once('=') {
                    findings.candidate(key.trim());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, content: &str) -> ManifestFindings {
        let mut findings = ManifestFindings::default();
        parse_manifest(path, content, &mut findings);
        findings
    }

    #[test]
    fn test_detect() {
        assert_eq!(ManifestKind::detect("api/requirements.txt"), Some(ManifestKind::Requirements));
        assert_eq!(ManifestKind::detect("dockerfile"), Some(ManifestKind::Dockerfile));
        assert_eq!(ManifestKind::detect("cargo.toml"), None);
        assert_eq!(ManifestKind::detect("src/app.py"), None);
    }

    #[test]
    fn test_requirements() {
        let f = parse(
            "requirements.txt",
            "# web\nflask==3.0.0\n\n-r base.txt\nrequests[socks]>=2.32\n  gunicorn\n",
        );
        assert_eq!(f.candidates, vec!["flask", "requests", "gunicorn"]);
        assert!(f.signals.is_empty());
    }

    #[test]
    fn test_package_json() {
        let f = parse(
            "package.json",
            r#"{"dependencies": {"react": "^18"}, "devDependencies": {"vite": "5"}, "peerDependencies": {"react-dom": "*"}}"#,
        );
        assert_eq!(f.candidates, vec!["react", "vite", "react-dom"]);

        let broken = parse("package.json", "{ not json");
        assert!(broken.candidates.is_empty());
        assert_eq!(broken.signals, vec!["package.json present"]);
    }

    #[test]
    fn test_pyproject_project_and_poetry() {
        let content = r#"
[project]
name = "demo"
dependencies = ["fastapi>=0.110", "pydantic"]

[tool.poetry.dependencies]
python = "^3.11"
httpx = "^0.27"
"#;
        let f = parse("pyproject.toml", content);
        assert_eq!(f.candidates, vec!["fastapi", "pydantic", "httpx"]);
        assert!(f.signals.is_empty());
    }

    #[test]
    fn test_malformed_pyproject_uses_fallback() {
        let content = "[project]\ndependencies = [\"uvicorn\", \"starlette>=0.3\"]\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nrich = \"*\"\nbroken = = =\n";
        let f = parse("pyproject.toml", content);
        assert!(f.candidates.contains(&"uvicorn".to_string()));
        assert!(f.candidates.contains(&"rich".to_string()));
        assert!(!f.candidates.contains(&"python".to_string()));
        assert_eq!(f.signals, vec!["pyproject.toml present"]);
    }

    #[test]
    fn test_setup_py_and_cfg() {
        let f = parse(
            "setup.py",
            "setup(name='x', install_requires=[\n  'click>=8',\n  \"jinja2\",\n])",
        );
        assert_eq!(f.candidates, vec!["click", "jinja2"]);
        assert_eq!(f.signals, vec!["setup.py present"]);

        let cfg = "[metadata]\nname = x\n\n[options]\ninstall_requires =\n    attrs>=21\n    pyyaml\npackages = find:\n";
        let f = parse("setup.cfg", cfg);
        assert_eq!(f.candidates, vec!["attrs", "pyyaml"]);
        assert_eq!(f.signals, vec!["setup.cfg present"]);
    }

    #[test]
    fn test_go_mod() {
        let content = "module example.com/app\n\ngo 1.22\n\nrequire github.com/spf13/cobra v1.8.0\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\t// comment\n\tgolang.org/x/sync v0.7.0\n)\n";
        let f = parse("go.mod", content);
        assert_eq!(f.candidates, vec!["cobra", "gin", "sync"]);
    }

    #[test]
    fn test_cargo_toml() {
        let f = parse(
            "Cargo.toml",
            "[package]\nname = \"x\"\n\n[dependencies]\nserde = \"1\"\ntokio = { version = \"1\" }\n\n[dev-dependencies]\nproptest = \"1\"\n",
        );
        assert_eq!(f.candidates, vec!["serde", "tokio"]);

        let broken = parse("Cargo.toml", "[dependencies]\nanyhow = \"1\"\nbad = \n");
        assert_eq!(broken.candidates, vec!["anyhow", "bad"]);
    }

    #[test]
    fn test_pom_docker_tsconfig() {
        let f = parse(
            "pom.xml",
            "<dependency><artifactId>spring-boot-starter-web</artifactId></dependency>",
        );
        assert_eq!(f.candidates, vec!["spring-boot-starter-web"]);

        let f = parse("deploy/Dockerfile", "FROM python:3.12");
        assert_eq!(f.candidates, vec!["Docker"]);
        assert_eq!(f.signals, vec!["Dockerfile present"]);

        let f = parse("docker-compose.yml", "services: {}");
        assert_eq!(f.signals, vec!["docker-compose.yml present"]);

        let f = parse("tsconfig.json", "{}");
        assert_eq!(f.candidates, vec!["TypeScript"]);
    }
}
