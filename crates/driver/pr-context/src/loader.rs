//! The package loading protocol

use crate::GlobalContext;
use crate::error::LoadError;
use pr_model::{PackageContext, PackageNameQualified};
use pr_span::Position;

/// Produces a fully processed package from a qualified name
///
/// Implementations map the name to a source, feed its statements through a
/// pipeline and return the single package that source declares. Every
/// problem is pushed onto the context's error queue before returning
/// [`LoadError`]; a missing source is reported as `PACKAGE_NONEXISTENT`.
///
/// Loaders are called by [`GlobalContext::load_package`], never directly: the
/// context takes care of caching and of circular imports.
pub trait PackageLoader {
    /// Loads `name`, importing other packages through `ctx` as needed
    ///
    /// `importer` is the position of the import that asked for the package,
    /// if any.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] once diagnostics explaining the failure have
    /// been queued on `ctx`
    fn load(
        &self,
        ctx: &mut GlobalContext,
        name: &PackageNameQualified,
        importer: Option<Position>,
    ) -> Result<PackageContext, LoadError>;
}
