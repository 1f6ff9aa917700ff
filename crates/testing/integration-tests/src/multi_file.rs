//! Multi-package test projects
//!
//! A [`MultiFileProject`] is a package tree held in memory. Running it writes
//! the tree to a temporary directory, checks the requested packages through
//! the file-system loader and compares the diagnostics with the expectation.

use anyhow::{Context, Result};
use pr_context::GlobalContext;
use pr_driver::{CheckReport, FileSystemLoader, SOURCE_EXTENSION, check_packages};
use pr_model::{Capabilities, PackageNameQualified};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Result of running a multi-file test
#[derive(Debug)]
pub enum TestResult {
    /// The project behaved as expected
    Pass,
    /// It did not
    Fail {
        /// What went wrong
        reason: String,
    },
}

/// Expected outcome of checking a project
#[derive(Debug, Clone)]
pub enum ExpectedResult {
    /// No diagnostics at all
    Success,
    /// Exactly these diagnostics, in order; each pattern must occur in the
    /// rendered message of the matching diagnostic
    Diagnostics {
        /// One pattern per diagnostic
        patterns: Vec<String>,
    },
}

/// A package tree to check
#[derive(Debug, Clone)]
pub struct MultiFileProject {
    /// Name of the project, used as its directory name
    pub name: String,
    /// Source text by path relative to the project root
    pub files: BTreeMap<PathBuf, String>,
    /// Packages to check, in order
    pub roots: Vec<String>,
    /// Descriptor the checker runs against
    pub capabilities: Capabilities,
    /// What checking should produce
    pub expected: ExpectedResult,
}

impl MultiFileProject {
    /// Creates an empty project expecting success
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
            roots: Vec::new(),
            capabilities: Capabilities::default(),
            expected: ExpectedResult::Success,
        }
    }

    /// Adds a raw file at `path`
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Adds the source of package `name` where the file-system loader looks for it
    pub fn add_package(&mut self, name: &str, content: impl Into<String>) {
        let mut path: PathBuf = name.split('.').collect();
        path.set_extension(SOURCE_EXTENSION);
        self.add_file(path, content);
    }

    /// Requests a package to be checked
    pub fn check_package(&mut self, name: impl Into<String>) {
        self.roots.push(name.into());
    }

    /// Expects checking to produce no diagnostics
    pub fn expect_success(&mut self) {
        self.expected = ExpectedResult::Success;
    }

    /// Expects exactly one diagnostic per pattern
    pub fn expect_errors<S: Into<String>>(&mut self, patterns: impl IntoIterator<Item = S>) {
        self.expected = ExpectedResult::Diagnostics {
            patterns: patterns.into_iter().map(Into::into).collect(),
        };
    }

    /// Writes the project to a fresh directory and checks every requested package
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be written or a requested
    /// package name is invalid
    pub fn check(&self) -> Result<CheckReport> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let root = temp_dir.path().join(&self.name);
        for (path, content) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&full_path, content)
                .with_context(|| format!("Failed to write {}", full_path.display()))?;
        }

        let names = self
            .roots
            .iter()
            .map(|name| {
                name.parse::<PackageNameQualified>()
                    .with_context(|| format!("Invalid package name `{name}`"))
            })
            .collect::<Result<Vec<_>>>()?;

        let loader = FileSystemLoader::new(&root, Rc::new(self.capabilities.clone()));
        let mut ctx = GlobalContext::new(Rc::new(loader));
        Ok(check_packages(&mut ctx, &names))
    }

    /// Checks the project and compares the outcome with the expectation
    #[must_use]
    pub fn run(&self) -> TestResult {
        let report = match self.check() {
            Ok(report) => report,
            Err(error) => {
                return TestResult::Fail {
                    reason: format!("{error:#}"),
                };
            }
        };

        let messages: Vec<String> = report
            .packages()
            .flat_map(|(_, errors)| errors.iter().map(ToString::to_string))
            .collect();
        match &self.expected {
            ExpectedResult::Success if messages.is_empty() => TestResult::Pass,
            ExpectedResult::Success => TestResult::Fail {
                reason: format!("expected no diagnostics, got:\n{report}"),
            },
            ExpectedResult::Diagnostics { patterns } => {
                if messages.len() != patterns.len() {
                    return TestResult::Fail {
                        reason: format!(
                            "expected {} diagnostics, got {}:\n{report}",
                            patterns.len(),
                            messages.len()
                        ),
                    };
                }
                for (message, pattern) in messages.iter().zip(patterns) {
                    if !message.contains(pattern.as_str()) {
                        return TestResult::Fail {
                            reason: format!("`{message}` does not contain `{pattern}`"),
                        };
                    }
                }
                TestResult::Pass
            }
        }
    }
}

/// Creates a new project with the given name
#[must_use]
pub fn create_project(name: &str) -> MultiFileProject {
    MultiFileProject::new(name)
}

/// Two packages that import each other
#[must_use]
pub fn circular_imports() -> MultiFileProject {
    let mut project = create_project("circular-imports");
    project.add_package(
        "x.y.a",
        "(package-begin x.y.a)
(import x.y.b as b)
(record A [(field other b.B)])
(package-end)
",
    );
    project.add_package(
        "x.y.b",
        "(package-begin x.y.b)
(import x.y.a as a)
(record B [(field other a.A)])
(package-end)
",
    );
    project.check_package("x.y.a");
    project.expect_errors([
        "Circular import: x.y.a -> x.y.b -> x.y.a",
        "Error loading package `x.y.a`",
        "Error loading package `x.y.b`",
    ]);
    project
}

/// A small schema spread over three packages
#[must_use]
pub fn shapes_library() -> MultiFileProject {
    let mut project = create_project("shapes-library");
    project.add_package(
        "com.example.math",
        "; basic vector types
(package-begin com.example.math)
(record Vec2 [(field x (float 32)) (field y (float 32))])
(record Mat2 [(field m (matrix (float 32) 2 2))])
(package-end)
",
    );
    project.add_package(
        "com.example.color",
        "(package-begin com.example.color)
(packed Rgb565 [(field r (integer unsigned-normalized 5))
                (field g (integer unsigned-normalized 6))
                (field b (integer unsigned-normalized 5))])
(package-end)
",
    );
    project.add_package(
        "com.example.shapes",
        "(package-begin com.example.shapes)
(import com.example.math as m)
(import com.example.color as c)
(record Circle [(field centre m.Vec2)
                (field radius (float 32))
                (field fill c.Rgb565)
                (padding-octets 2)])
(union Shape [(case circle Circle) (case point m.Vec2)])
(record Tagged [(field kind (integer unsigned 8))
                (padding-octets 3)
                (field shape Shape)
                (field name (string 16 \"UTF-8\"))
                (field flags (boolean-set 1 [visible selected]))])
(:type (type-of Circle centre.x))
(:size (size-in-octets Tagged))
(package-end)
",
    );
    project.check_package("com.example.shapes");
    project.check_package("com.example.math");
    project
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_package_paths() {
        let mut project = create_project("test");
        project.add_package("a.b.c", "(package-begin a.b.c) (package-end)");
        assert!(project.files.contains_key(Path::new("a/b/c.prs")));
    }

    #[test]
    fn test_expect_errors() {
        let mut project = create_project("test");
        project.expect_errors(["one", "two"]);
        match project.expected {
            ExpectedResult::Diagnostics { patterns } => assert_eq!(patterns, ["one", "two"]),
            ExpectedResult::Success => panic!("expected diagnostics"),
        }
    }

    #[test]
    fn test_invalid_root_fails() {
        let mut project = create_project("test");
        project.check_package("Not.Valid");
        assert!(matches!(project.run(), TestResult::Fail { .. }));
    }
}
