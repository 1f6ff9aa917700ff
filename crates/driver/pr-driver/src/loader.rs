//! Package loaders backed by a directory tree or by memory

use crate::pipeline::compile_source;
use anyhow::{Context, Result};
use pr_context::{CompileError, GlobalContext, LoadError, PackageLoader, ResolveError};
use pr_model::{Capabilities, PackageContext, PackageNameQualified};
use pr_span::{FileId, Position};
use pr_vfs::SourceFiles;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Extension of package source files
pub const SOURCE_EXTENSION: &str = "prs";

fn missing(
    ctx: &mut GlobalContext,
    name: &PackageNameQualified,
    importer: Option<Position>,
) -> LoadError {
    ctx.push_error(ResolveError::PackageNonexistent {
        package: name.clone(),
        position: importer,
    });
    LoadError::Failed(name.clone())
}

fn unreadable(ctx: &mut GlobalContext, name: &PackageNameQualified, error: &anyhow::Error) -> LoadError {
    ctx.push_error(CompileError::Io {
        package: name.clone(),
        message: format!("{error:#}"),
    });
    LoadError::Failed(name.clone())
}

/// Loads package `a.b.c` from `<root>/a/b/c.prs`
#[derive(Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
    capabilities: Rc<Capabilities>,
    sources: SourceFiles,
}

impl FileSystemLoader {
    /// Creates a loader for the package tree under `root`
    pub fn new(root: impl Into<PathBuf>, capabilities: Rc<Capabilities>) -> Self {
        Self {
            root: root.into(),
            capabilities,
            sources: SourceFiles::new(),
        }
    }

    /// Root of the package tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every source read so far, for mapping diagnostics back to paths
    pub fn sources(&self) -> &SourceFiles {
        &self.sources
    }

    /// Where the source of `name` lives
    pub fn package_path(&self, name: &PackageNameQualified) -> PathBuf {
        let mut path = self.root.clone();
        for segment in name.segments() {
            path.push(segment.as_str());
        }
        path.set_extension(SOURCE_EXTENSION);
        path
    }

    fn read_source(&self, path: &Path) -> Result<(FileId, Arc<str>)> {
        let file = self
            .sources
            .register(path)
            .with_context(|| format!("Failed to register {}", path.display()))?;
        let text = self.sources.read(file)?;
        Ok((file, text))
    }
}

impl PackageLoader for FileSystemLoader {
    fn load(
        &self,
        ctx: &mut GlobalContext,
        name: &PackageNameQualified,
        importer: Option<Position>,
    ) -> Result<PackageContext, LoadError> {
        let path = self.package_path(name);
        if !path.is_file() {
            debug!(package = %name, path = %path.display(), "no source for package");
            return Err(missing(ctx, name, importer));
        }
        let (file, text) = self
            .read_source(&path)
            .map_err(|error| unreadable(ctx, name, &error))?;
        debug!(package = %name, path = %path.display(), "compiling source");
        compile_source(ctx, name, file, &text, Rc::clone(&self.capabilities))
    }
}

/// Serves package sources held in memory
#[derive(Clone, Default)]
pub struct MemoryLoader {
    capabilities: Rc<Capabilities>,
    packages: FxHashMap<PackageNameQualified, String>,
    sources: SourceFiles,
}

impl MemoryLoader {
    /// Creates a loader with no packages
    pub fn new(capabilities: Rc<Capabilities>) -> Self {
        Self {
            capabilities,
            packages: FxHashMap::default(),
            sources: SourceFiles::new(),
        }
    }

    /// Adds or replaces the source of `name`
    pub fn insert(&mut self, name: PackageNameQualified, text: impl Into<String>) {
        self.packages.insert(name, text.into());
    }

    /// Adds a source, parsing the package name
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a qualified package name
    pub fn with_package(mut self, name: &str, text: impl Into<String>) -> Result<Self> {
        let name = name
            .parse()
            .with_context(|| format!("Invalid package name `{name}`"))?;
        self.insert(name, text);
        Ok(self)
    }

    /// Every source compiled so far
    pub fn sources(&self) -> &SourceFiles {
        &self.sources
    }
}

impl PackageLoader for MemoryLoader {
    fn load(
        &self,
        ctx: &mut GlobalContext,
        name: &PackageNameQualified,
        importer: Option<Position>,
    ) -> Result<PackageContext, LoadError> {
        let Some(text) = self.packages.get(name) else {
            return Err(missing(ctx, name, importer));
        };
        let file = self
            .sources
            .insert_memory(format!("{name}.{SOURCE_EXTENSION}"), text)
            .map_err(|error| unreadable(ctx, name, &error))?;
        compile_source(ctx, name, file, text, Rc::clone(&self.capabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_context::{ErrorKind, ResolveErrorCode};
    use std::fs;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_package_path_layout() {
        let loader = FileSystemLoader::new("/src", Rc::new(Capabilities::default()));
        assert_eq!(
            loader.package_path(&"com.example.shapes".parse().unwrap()),
            PathBuf::from("/src/com/example/shapes.prs")
        );
    }

    #[test]
    fn test_loads_tree_with_imports() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "geo/base.prs",
            "(package-begin geo.base)
             (record Vec2 [(field x (float 32)) (field y (float 32))])
             (package-end)",
        );
        write(
            dir.path(),
            "geo/shapes.prs",
            "(package-begin geo.shapes)
             (import geo.base as b)
             (record Circle [(field centre b.Vec2) (field radius (float 32))])
             (package-end)",
        );

        let loader = Rc::new(FileSystemLoader::new(
            dir.path(),
            Rc::new(Capabilities::default()),
        ));
        let mut ctx = GlobalContext::new(Rc::clone(&loader) as Rc<dyn PackageLoader>);
        let shapes = ctx
            .load_package(&"geo.shapes".parse().unwrap(), None)
            .unwrap();
        assert!(ctx.errors().is_empty());
        let circle = shapes.get(&"Circle".parse().unwrap()).unwrap();
        assert_eq!(circle.size_in_bits().to_string(), "96");

        // The import was cached along the way
        assert!(ctx.package(&"geo.base".parse().unwrap()).is_some());
        let base_path = dir.path().join("geo/base.prs");
        assert!(loader.sources().lookup(&base_path).unwrap().is_some());
    }

    #[test]
    fn test_missing_file_is_nonexistent_package() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileSystemLoader::new(dir.path(), Rc::new(Capabilities::default()));
        let mut ctx = GlobalContext::new(Rc::new(loader));
        assert!(ctx.load_package(&"nope".parse().unwrap(), None).is_err());
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(
            ctx.errors()[0].resolve_code(),
            Some(ResolveErrorCode::PackageNonexistent)
        );
    }

    #[test]
    fn test_directory_in_place_of_source_is_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg.prs")).unwrap();
        let loader = FileSystemLoader::new(dir.path(), Rc::new(Capabilities::default()));
        let mut ctx = GlobalContext::new(Rc::new(loader));
        assert!(ctx.load_package(&"pkg".parse().unwrap(), None).is_err());
        assert_eq!(
            ctx.errors()[0].resolve_code(),
            Some(ResolveErrorCode::PackageNonexistent)
        );
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin.prs"), [0xff, 0xfe, 0x00]).unwrap();
        let loader = FileSystemLoader::new(dir.path(), Rc::new(Capabilities::default()));
        let mut ctx = GlobalContext::new(Rc::new(loader));
        assert!(ctx.load_package(&"bin".parse().unwrap(), None).is_err());
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].kind(), ErrorKind::Io);
        assert!(ctx.errors()[0].to_string().starts_with("could not read package `bin`"));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new(Rc::new(Capabilities::default()))
            .with_package(
                "app.flags",
                "(package-begin app.flags)
                 (packed Flags [(field a (integer unsigned 1)) (padding-bits 7)])
                 (package-end)",
            )
            .unwrap();
        assert!(MemoryLoader::default().with_package("App", "").is_err());

        let mut ctx = GlobalContext::new(Rc::new(loader));
        let package = ctx.load_package(&"app.flags".parse().unwrap(), None).unwrap();
        assert_eq!(package.types().len(), 1);
        assert!(ctx.load_package(&"app.other".parse().unwrap(), None).is_err());
    }
}
