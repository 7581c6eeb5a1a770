//! Boilerplate file contents for a new Python package.

use crate::git::Identity;
use crate::scaffold::ProjectSpec;

const GITIGNORE: &str = "\
# Byte-compiled / optimized files
__pycache__/
*.py[cod]
*$py.class

# C extensions
*.so

# Distribution / packaging
build/
dist/
wheels/
*.egg-info/
.eggs/
*.egg
MANIFEST

# Unit test / coverage reports
.pytest_cache/
.coverage
.coverage.*
htmlcov/
.tox/
.nox/
coverage.xml

# Type checkers and linters
.mypy_cache/
.ruff_cache/
.pyre/

# Environments
.env
.venv/
env/
venv/

# Editors
.idea/
.vscode/
*.swp
.DS_Store
";

/// Contents of `.gitignore`.
#[must_use]
pub fn gitignore() -> &'static str {
    GITIGNORE
}

// TOML basic strings may not hold `\`, `"` or raw control characters.
fn toml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

fn authors_line(author: Option<&Identity>) -> String {
    match author {
        Some(id) => format!(
            "authors = [{{ name = \"{}\", email = \"{}\" }}]\n",
            toml_escape(&id.name),
            toml_escape(&id.email)
        ),
        None => String::new(),
    }
}

fn urls_section(spec: &ProjectSpec) -> String {
    match spec.author.as_ref().and_then(|a| a.github_user.as_deref()) {
        Some(user) => format!(
            "\n[project.urls]\nHomepage = \"https://github.com/{user}/{name}\"\n\
             Issues = \"https://github.com/{user}/{name}/issues\"\n",
            user = toml_escape(user),
            name = spec.name,
        ),
        None => String::new(),
    }
}

/// Contents of `pyproject.toml`, using a `src/` layout and hatchling.
#[must_use]
pub fn pyproject(spec: &ProjectSpec) -> String {
    format!(
        r#"[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"

[project]
name = "{name}"
version = "0.1.0"
description = "{description}"
readme = "README.md"
requires-python = ">=3.9"
license = {{ text = "MIT" }}
{authors}dependencies = []

[project.optional-dependencies]
dev = ["pytest>=7"]
{urls}
[tool.hatch.build.targets.wheel]
packages = ["src/{module}"]

[tool.pytest.ini_options]
testpaths = ["tests"]
"#,
        name = spec.name,
        description = toml_escape(&spec.description),
        authors = authors_line(spec.author.as_ref()),
        urls = urls_section(spec),
        module = spec.name.module_name(),
    )
}

/// Contents of `README.md`.
#[must_use]
pub fn readme(spec: &ProjectSpec) -> String {
    format!(
        "# {name}\n\n{description}\n\n## Installation\n\n```sh\npip install {name}\n```\n\n\
         ## Usage\n\n```python\nimport {module}\n\nprint({module}.__version__)\n```\n\n\
         ## Development\n\n```sh\npip install -e '.[dev]'\npytest\n```\n",
        name = spec.name,
        description = spec.description,
        module = spec.name.module_name(),
    )
}

/// Contents of `src/<module>/__init__.py`.
#[must_use]
pub fn package_init(spec: &ProjectSpec) -> String {
    let description = spec.description.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"\"\"{description}\"\"\"\n\n__version__ = \"0.1.0\"\n")
}

/// Contents of `tests/test_<module>.py`.
#[must_use]
pub fn smoke_test(spec: &ProjectSpec) -> String {
    let module = spec.name.module_name();
    format!(
        "import {module}\n\n\ndef test_version():\n    assert {module}.__version__ == \"0.1.0\"\n"
    )
}
