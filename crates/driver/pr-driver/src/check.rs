//! Batch checking of several packages

use indexmap::IndexMap;
use pr_context::{CompileError, GlobalContext};
use pr_model::PackageNameQualified;
use std::fmt;
use tracing::{debug, warn};

/// Diagnostics of a batch, grouped by the package that was requested
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    packages: IndexMap<PackageNameQualified, Vec<CompileError>>,
}

impl CheckReport {
    /// Whether no package produced any diagnostic
    pub fn is_success(&self) -> bool {
        self.packages.values().all(Vec::is_empty)
    }

    /// Diagnostics queued while loading `name`
    pub fn diagnostics(&self, name: &PackageNameQualified) -> &[CompileError] {
        self.packages.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every requested package with its diagnostics, in request order
    pub fn packages(&self) -> impl Iterator<Item = (&PackageNameQualified, &[CompileError])> {
        self.packages
            .iter()
            .map(|(name, errors)| (name, errors.as_slice()))
    }

    /// Total number of diagnostics
    pub fn error_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (package, errors) in &self.packages {
            for error in errors {
                write!(formatter, "{package}: {} error: {error}", error.kind())?;
                if let Some(position) = error.position() {
                    write!(formatter, " ({position})")?;
                }
                writeln!(formatter)?;
            }
        }
        Ok(())
    }
}

/// Loads every package in `names`, collecting diagnostics per package
///
/// A failing package does not stop the batch. Packages loaded by an earlier
/// entry, directly or through imports, are served from the cache.
pub fn check_packages<'a>(
    ctx: &mut GlobalContext,
    names: impl IntoIterator<Item = &'a PackageNameQualified>,
) -> CheckReport {
    let mut report = CheckReport::default();
    for name in names {
        let result = ctx.load_package(name, None);
        let errors = ctx.take_errors();
        match result {
            Ok(package) => debug!(package = %name, types = package.types().len(), "package ok"),
            Err(error) => warn!(package = %name, errors = errors.len(), "{error}"),
        }
        report.packages.entry(name.clone()).or_default().extend(errors);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLoader;
    use expect_test::expect;
    use pr_model::Capabilities;
    use std::rc::Rc;

    fn loader() -> MemoryLoader {
        MemoryLoader::new(Rc::new(Capabilities::default()))
            .with_package(
                "demo.good",
                "(package-begin demo.good) (record A [(field x (float 32))]) (package-end)",
            )
            .unwrap()
            .with_package(
                "demo.bad",
                "(package-begin demo.bad)\n(record B [(field x (float 7))])\n(package-end)",
            )
            .unwrap()
    }

    #[test]
    fn test_batch_reports_every_package() {
        let mut ctx = GlobalContext::new(Rc::new(loader()));
        let names: Vec<PackageNameQualified> = ["demo.good", "demo.bad", "demo.gone"]
            .iter()
            .map(|name| name.parse().unwrap())
            .collect();
        let report = check_packages(&mut ctx, &names);

        assert!(!report.is_success());
        assert_eq!(report.error_count(), 2);
        assert!(report.diagnostics(&names[0]).is_empty());
        expect![[r#"
            demo.bad: check error: unsupported float size 7 (file#1:2:21)
            demo.gone: resolution error: package `demo.gone` does not exist
        "#]]
        .assert_eq(&report.to_string());
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_successful_batch() {
        let mut ctx = GlobalContext::new(Rc::new(loader()));
        let good: PackageNameQualified = "demo.good".parse().unwrap();
        let report = check_packages(&mut ctx, [&good, &good]);
        assert!(report.is_success());
        assert_eq!(report.packages().count(), 1);
    }
}
