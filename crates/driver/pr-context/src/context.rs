//! Global compilation state

use crate::error::{CompileError, LoadError};
use crate::graph::{ImportGraph, PackageImport};
use crate::loader::PackageLoader;
use num_bigint::BigUint;
use pr_model::{Identifier, PackageContext, PackageNameQualified, TypeDecl};
use pr_span::Position;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// State shared by every package of one compilation run
///
/// Owns the identifier allocator, the package cache, the global type table
/// and the error queue, and runs the package loading protocol. One value is
/// created per run and lent by `&mut` to the passes that need it.
pub struct GlobalContext {
    next_identifier: BigUint,
    packages: FxHashMap<PackageNameQualified, Rc<PackageContext>>,
    types: FxHashMap<Identifier, Rc<TypeDecl>>,
    errors: Vec<CompileError>,
    /// Packages whose load is in progress, outermost first
    loading: Vec<PackageNameQualified>,
    imports: ImportGraph,
    loader: Rc<dyn PackageLoader>,
}

impl GlobalContext {
    /// Creates an empty context that reads packages through `loader`
    pub fn new(loader: Rc<dyn PackageLoader>) -> Self {
        Self {
            next_identifier: BigUint::default(),
            packages: FxHashMap::default(),
            types: FxHashMap::default(),
            errors: Vec::new(),
            loading: Vec::new(),
            imports: ImportGraph::new(),
            loader,
        }
    }

    /// Allocates an identifier no other call has returned
    pub fn fresh_identifier(&mut self) -> Identifier {
        let identifier = Identifier::from_raw(self.next_identifier.clone());
        self.next_identifier += 1u32;
        trace!(%identifier, "allocated identifier");
        identifier
    }

    /// Returns the package called `name`, loading it on first use
    ///
    /// `importer` is the position of the import statement asking for the
    /// package, if any. Loading a package that is already being loaded
    /// further up the import chain queues a circular import diagnostic with
    /// the full cycle. Failed loads are never cached.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the package could not be loaded; the reasons
    /// are on the error queue.
    pub fn load_package(
        &mut self,
        name: &PackageNameQualified,
        importer: Option<Position>,
    ) -> Result<Rc<PackageContext>, LoadError> {
        if let Some(package) = self.packages.get(name) {
            debug!(package = %name, "package cache hit");
            return Ok(Rc::clone(package));
        }

        if let Some(importing) = self.loading.last() {
            self.imports.add_import(&PackageImport {
                from: importing.clone(),
                to: name.clone(),
                position: importer,
            });
        }

        if let Some(current) = self.loading.last().filter(|_| self.loading.contains(name)) {
            let mut path = self
                .imports
                .shortest_path(name, current)
                .unwrap_or_default();
            path.push(PackageImport {
                from: current.clone(),
                to: name.clone(),
                position: importer,
            });
            warn!(package = %name, edges = path.len(), "circular import");
            self.errors.push(CompileError::CircularImport {
                path,
                position: importer,
            });
            return Err(LoadError::Circular(name.clone()));
        }

        debug!(package = %name, depth = self.loading.len(), "loading package");
        let queued = self.errors.len();
        self.loading.push(name.clone());
        let loader = Rc::clone(&self.loader);
        let result = loader.load(self, name, importer);
        self.loading.pop();
        if self.loading.is_empty() {
            self.imports = ImportGraph::new();
        }

        match result {
            Ok(package) if self.errors.len() == queued => {
                let package = Rc::new(package);
                self.packages.insert(name.clone(), Rc::clone(&package));
                debug!(package = %name, types = package.types().len(), "loaded package");
                Ok(package)
            }
            _ => {
                debug!(
                    package = %name,
                    errors = self.errors.len() - queued,
                    "failed to load package"
                );
                Err(LoadError::Failed(name.clone()))
            }
        }
    }

    /// A package loaded earlier in this run
    pub fn package(&self, name: &PackageNameQualified) -> Option<&Rc<PackageContext>> {
        self.packages.get(name)
    }

    /// Whether `name` is being loaded further up the call stack
    pub fn is_loading(&self, name: &PackageNameQualified) -> bool {
        self.loading.contains(name)
    }

    /// Adds a checked declaration to the global type table
    ///
    /// # Panics
    ///
    /// Panics if `identifier` is already bound; identifiers are never reused,
    /// so this means the allocator or a pass is broken.
    pub fn put_type(&mut self, identifier: Identifier, decl: Rc<TypeDecl>) {
        debug_assert_eq!(identifier, decl.identifier);
        match self.types.entry(identifier) {
            Entry::Occupied(entry) => panic!(
                "identifier {} is already bound to type {}.{}",
                entry.key(),
                entry.get().package,
                entry.get().name
            ),
            Entry::Vacant(entry) => {
                trace!(identifier = %entry.key(), name = %decl.name, "registered type");
                entry.insert(decl);
            }
        }
    }

    /// Looks up a declaration by identifier
    ///
    /// # Panics
    ///
    /// Panics if no declaration was registered under `identifier`; resolved
    /// trees only contain identifiers of checked declarations.
    pub fn get_type(&self, identifier: &Identifier) -> &Rc<TypeDecl> {
        self.types
            .get(identifier)
            .unwrap_or_else(|| panic!("no type is registered under identifier {identifier}"))
    }

    /// Appends a diagnostic to the error queue
    pub fn push_error(&mut self, error: impl Into<CompileError>) {
        self.errors.push(error.into());
    }

    /// The error queue, oldest first
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// Drains the error queue
    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }
}

impl std::fmt::Debug for GlobalContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GlobalContext")
            .field("next_identifier", &self.next_identifier)
            .field("packages", &self.packages.len())
            .field("types", &self.types.len())
            .field("errors", &self.errors.len())
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ResolveError, ResolveErrorCode};
    use indexmap::IndexMap;
    use pr_model::{PackedType, TypeDeclKind, TypeName};
    use pr_span::FileId;
    use rustc_hash::FxHashSet;
    use std::cell::Cell;

    fn position() -> Position {
        Position::new(FileId::new(0), 1, 1)
    }

    /// Packages that only import each other, by dotted name
    #[derive(Default)]
    struct ImportOnlyLoader {
        packages: FxHashMap<String, Vec<&'static str>>,
        loads: Cell<usize>,
    }

    impl ImportOnlyLoader {
        fn with(mut self, name: &str, imports: &[&'static str]) -> Self {
            self.packages.insert(name.to_owned(), imports.to_vec());
            self
        }
    }

    impl PackageLoader for ImportOnlyLoader {
        fn load(
            &self,
            ctx: &mut GlobalContext,
            name: &PackageNameQualified,
            importer: Option<Position>,
        ) -> Result<PackageContext, LoadError> {
            self.loads.set(self.loads.get() + 1);
            let Some(imports) = self.packages.get(&name.to_string()) else {
                ctx.push_error(ResolveError::PackageNonexistent {
                    package: name.clone(),
                    position: importer,
                });
                return Err(LoadError::Failed(name.clone()));
            };
            for import in imports {
                let import: PackageNameQualified = import.parse().unwrap();
                if ctx.load_package(&import, Some(position())).is_err() {
                    ctx.push_error(ResolveError::PackageLoadFailed {
                        package: import,
                        position: position(),
                    });
                    return Err(LoadError::Failed(name.clone()));
                }
            }
            Ok(PackageContext::new(name.clone(), IndexMap::new()))
        }
    }

    fn context(loader: ImportOnlyLoader) -> (GlobalContext, Rc<ImportOnlyLoader>) {
        let loader = Rc::new(loader);
        (GlobalContext::new(Rc::clone(&loader) as Rc<dyn PackageLoader>), loader)
    }

    fn decl(ctx: &mut GlobalContext, name: &str) -> Rc<TypeDecl> {
        Rc::new(TypeDecl {
            identifier: ctx.fresh_identifier(),
            package: "a".parse().unwrap(),
            name: TypeName::new(name).unwrap(),
            position: position(),
            kind: TypeDeclKind::Packed(PackedType::layout(Vec::new())),
        })
    }

    #[test]
    fn test_fresh_identifiers_are_distinct() {
        let (mut ctx, _) = context(ImportOnlyLoader::default());
        let identifiers: FxHashSet<Identifier> =
            (0..1000).map(|_| ctx.fresh_identifier()).collect();
        assert_eq!(identifiers.len(), 1000);
    }

    #[test]
    fn test_load_is_cached() {
        let (mut ctx, loader) = context(
            ImportOnlyLoader::default()
                .with("x.y.a", &["x.y.b"])
                .with("x.y.b", &[]),
        );
        let name: PackageNameQualified = "x.y.a".parse().unwrap();

        let first = ctx.load_package(&name, None).unwrap();
        let second = ctx.load_package(&name, None).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(loader.loads.get(), 2);
        assert!(ctx.package(&"x.y.b".parse().unwrap()).is_some());
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_cycle_is_reported_once_with_full_path() {
        let (mut ctx, _) = context(
            ImportOnlyLoader::default()
                .with("x.y.a", &["x.y.b"])
                .with("x.y.b", &["x.y.a"]),
        );
        let name: PackageNameQualified = "x.y.a".parse().unwrap();

        let result = ctx.load_package(&name, None);
        assert_eq!(result.unwrap_err(), LoadError::Failed(name.clone()));

        let errors = ctx.take_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].kind(), ErrorKind::CircularImport);
        assert!(errors[0].to_string().contains("Circular import"));
        assert_eq!(
            errors[0].to_string(),
            "Circular import: x.y.a -> x.y.b -> x.y.a"
        );
        for error in &errors[1..] {
            assert_eq!(error.resolve_code(), Some(ResolveErrorCode::PackageLoadFailed));
            assert!(error.to_string().starts_with("Error loading package"));
        }
        assert!(errors[1].to_string().contains("x.y.a"));
        assert!(errors[2].to_string().contains("x.y.b"));
        assert!(ctx.package(&name).is_none());
        assert!(!ctx.is_loading(&name));
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let (mut ctx, _) = context(ImportOnlyLoader::default().with("me", &["me"]));
        assert!(ctx.load_package(&"me".parse().unwrap(), None).is_err());
        assert_eq!(ctx.errors()[0].to_string(), "Circular import: me -> me");
    }

    #[test]
    fn test_longer_cycle_reports_every_edge() {
        let (mut ctx, _) = context(
            ImportOnlyLoader::default()
                .with("root", &["a"])
                .with("a", &["b"])
                .with("b", &["c"])
                .with("c", &["a"]),
        );
        assert!(ctx.load_package(&"root".parse().unwrap(), None).is_err());
        assert_eq!(
            ctx.errors()[0].to_string(),
            "Circular import: a -> b -> c -> a"
        );
    }

    #[test]
    fn test_missing_package_is_not_cached() {
        let (mut ctx, loader) = context(ImportOnlyLoader::default());
        let name: PackageNameQualified = "nowhere".parse().unwrap();
        assert!(ctx.load_package(&name, None).is_err());
        assert!(ctx.load_package(&name, None).is_err());
        assert_eq!(loader.loads.get(), 2);
        assert_eq!(ctx.errors().len(), 2);
        assert_eq!(
            ctx.errors()[0].resolve_code(),
            Some(ResolveErrorCode::PackageNonexistent)
        );
    }

    #[test]
    fn test_type_table_round_trip() {
        let (mut ctx, _) = context(ImportOnlyLoader::default());
        let decl = decl(&mut ctx, "Flags");
        let identifier = decl.identifier.clone();
        ctx.put_type(identifier.clone(), Rc::clone(&decl));
        assert!(Rc::ptr_eq(ctx.get_type(&identifier), &decl));
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_duplicate_identifier_panics() {
        let (mut ctx, _) = context(ImportOnlyLoader::default());
        let first = decl(&mut ctx, "First");
        let second = Rc::new(TypeDecl {
            name: TypeName::new("Second").unwrap(),
            ..(*first).clone()
        });
        ctx.put_type(first.identifier.clone(), first);
        ctx.put_type(second.identifier.clone(), second);
    }

    #[test]
    #[should_panic(expected = "no type is registered")]
    fn test_missing_identifier_panics() {
        let (mut ctx, _) = context(ImportOnlyLoader::default());
        let identifier = ctx.fresh_identifier();
        ctx.get_type(&identifier);
    }
}
