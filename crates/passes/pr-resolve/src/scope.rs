//! Per-file scope: the open package, import aliases and local types

use pr_model::{
    BiMap, BiMapConflict, Identifier, PackageContext, PackageNameQualified,
    PackageNameUnqualified, TypeName,
};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Where a file is in its package structure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageState {
    /// Before `package-begin`
    #[default]
    NoPackage,
    /// Between `package-begin` and `package-end`
    InPackage(PackageNameQualified),
    /// After `package-end`
    Closed(PackageNameQualified),
}

/// Names visible to one source file
#[derive(Debug, Default)]
pub struct FileScope {
    state: PackageState,
    /// alias ↔ imported package
    imports: BiMap<PackageNameUnqualified, PackageNameQualified>,
    packages: FxHashMap<PackageNameQualified, Rc<PackageContext>>,
    /// local type name ↔ identifier, checked declarations only
    types: BiMap<TypeName, Identifier>,
}

impl FileScope {
    /// Creates a scope with no package open
    pub fn new() -> Self {
        Self::default()
    }

    /// Current package state
    pub fn state(&self) -> &PackageState {
        &self.state
    }

    /// The package being declared, if one is open
    pub fn current_package(&self) -> Option<&PackageNameQualified> {
        match &self.state {
            PackageState::InPackage(name) => Some(name),
            PackageState::NoPackage | PackageState::Closed(_) => None,
        }
    }

    pub(crate) fn set_state(&mut self, state: PackageState) {
        self.state = state;
    }

    /// Binds `alias` to an imported package
    pub(crate) fn bind_import(
        &mut self,
        alias: PackageNameUnqualified,
        package: Rc<PackageContext>,
    ) -> Result<(), BiMapConflict> {
        self.imports.insert(alias, package.name().clone())?;
        self.packages.insert(package.name().clone(), package);
        Ok(())
    }

    /// The package imported as `alias`
    pub fn lookup_import(&self, alias: &PackageNameUnqualified) -> Option<&Rc<PackageContext>> {
        let name = self.imports.forward().get(alias)?;
        self.packages.get(name)
    }

    /// The alias an imported package is bound to
    pub fn alias_of(&self, package: &PackageNameQualified) -> Option<&PackageNameUnqualified> {
        self.imports.inverse().get(package)
    }

    /// Whether a local type of that name has been declared
    pub fn is_type_defined(&self, name: &TypeName) -> bool {
        self.types.forward().contains_key(name)
    }

    /// Makes a checked local declaration visible to later statements
    pub(crate) fn define_type(
        &mut self,
        name: TypeName,
        identifier: Identifier,
    ) -> Result<(), BiMapConflict> {
        self.types.insert(name, identifier)
    }

    /// Identifier of a local declaration
    pub fn lookup_type(&self, name: &TypeName) -> Option<&Identifier> {
        self.types.forward().get(name)
    }

    /// Every local type name, for suggestions
    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.forward().keys()
    }
}
