//! Statement resolution

use crate::scope::{FileScope, PackageState};
use crate::suggest::compute_suggestions;
use pr_context::{GlobalContext, ResolveError};
use pr_model::{FieldName, PackageNameQualified, Type, TypeDecl, TypeName, ast, resolved};
use pr_span::Position;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, ResolveError>;

/// Binds the names of one source file's statements
///
/// Statements must be fed in file order. Type declarations become visible to
/// later statements only once [`Resolver::commit_type`] is called for their
/// checked form.
#[derive(Debug, Default)]
pub struct Resolver {
    scope: FileScope,
}

impl Resolver {
    /// Creates a resolver for a new file
    pub fn new() -> Self {
        Self::default()
    }

    /// The names visible so far
    pub fn scope(&self) -> &FileScope {
        &self.scope
    }

    /// Resolves one statement
    ///
    /// Imports load the imported package through `ctx`; declarations receive
    /// a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the statement breaks the package
    /// structure or mentions a name that cannot be bound. A
    /// [`ResolveError::PackageLoadFailed`] means the rest of the file cannot
    /// be resolved meaningfully.
    pub fn resolve_statement(
        &mut self,
        ctx: &mut GlobalContext,
        statement: ast::Statement,
    ) -> Result<resolved::Statement> {
        match statement {
            ast::Statement::PackageBegin { name, position } => match self.scope.state() {
                PackageState::NoPackage => {
                    debug!(package = %name, "package begins");
                    self.scope.set_state(PackageState::InPackage(name.clone()));
                    Ok(resolved::Statement::PackageBegin { name, position })
                }
                PackageState::InPackage(current) => Err(ResolveError::PackageNested {
                    current: current.clone(),
                    position,
                }),
                PackageState::Closed(previous) => Err(ResolveError::PackageDuplicate {
                    previous: previous.clone(),
                    position,
                }),
            },
            ast::Statement::PackageEnd { position } => {
                let name = self.require_package(position)?.clone();
                self.scope.set_state(PackageState::Closed(name.clone()));
                Ok(resolved::Statement::PackageEnd { name, position })
            }
            ast::Statement::Import {
                package,
                alias,
                position,
            } => self.resolve_import(ctx, package, alias, position),
            ast::Statement::TypeDecl(decl) => self
                .resolve_type_decl(ctx, decl)
                .map(resolved::Statement::TypeDecl),
            ast::Statement::CommandType { ty, position } => {
                self.require_package(position)?;
                Ok(resolved::Statement::CommandType {
                    ty: self.resolve_type(ctx, ty)?,
                    position,
                })
            }
            ast::Statement::CommandSize { size, position } => {
                self.require_package(position)?;
                Ok(resolved::Statement::CommandSize {
                    size: self.resolve_size(ctx, size)?,
                    position,
                })
            }
        }
    }

    /// Makes a checked declaration visible to later statements
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::TypeDuplicate`] if the name was committed
    /// before
    pub fn commit_type(&mut self, decl: &TypeDecl) -> Result<()> {
        self.scope
            .define_type(decl.name.clone(), decl.identifier.clone())
            .map_err(|_| ResolveError::TypeDuplicate {
                name: decl.name.clone(),
                position: decl.position,
            })?;
        trace!(name = %decl.name, identifier = %decl.identifier, "committed type");
        Ok(())
    }

    /// Checks that the file ended in a sensible state
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ExpectedPackage`] if no package was declared
    /// and [`ResolveError::UnexpectedEof`] if the package is still open
    pub fn finish(&self, eof: Position) -> Result<()> {
        match self.scope.state() {
            PackageState::NoPackage => Err(ResolveError::ExpectedPackage { position: eof }),
            PackageState::InPackage(package) => Err(ResolveError::UnexpectedEof {
                package: package.clone(),
                position: eof,
            }),
            PackageState::Closed(_) => Ok(()),
        }
    }

    fn require_package(&self, position: Position) -> Result<&PackageNameQualified> {
        self.scope
            .current_package()
            .ok_or(ResolveError::NoCurrentPackage { position })
    }

    fn resolve_import(
        &mut self,
        ctx: &mut GlobalContext,
        package: PackageNameQualified,
        alias: pr_model::PackageNameUnqualified,
        position: Position,
    ) -> Result<resolved::Statement> {
        self.require_package(position)?;
        let conflict = || ResolveError::PackageImportConflict {
            package: package.clone(),
            alias: alias.clone(),
            position,
        };
        if self.scope.lookup_import(&alias).is_some() || self.scope.alias_of(&package).is_some() {
            return Err(conflict());
        }

        let loaded = ctx
            .load_package(&package, Some(position))
            .map_err(|_| ResolveError::PackageLoadFailed {
                package: package.clone(),
                position,
            })?;
        self.scope
            .bind_import(alias.clone(), loaded)
            .map_err(|_| conflict())?;
        debug!(%package, %alias, "bound import");
        Ok(resolved::Statement::Import { package, position })
    }

    fn resolve_type_decl(
        &self,
        ctx: &mut GlobalContext,
        decl: ast::TypeDecl,
    ) -> Result<resolved::TypeDecl> {
        let ast::TypeDecl {
            name,
            body,
            position,
        } = decl;
        let package = self.require_package(position)?.clone();
        if self.scope.is_type_defined(&name) {
            return Err(ResolveError::TypeDuplicate { name, position });
        }

        let body = match body {
            ast::DeclBody::Record(members) => resolved::DeclBody::Record(
                members
                    .into_iter()
                    .map(|member| self.resolve_record_member(ctx, member))
                    .collect::<Result<_>>()?,
            ),
            ast::DeclBody::Packed(members) => resolved::DeclBody::Packed(
                members
                    .into_iter()
                    .map(|member| self.resolve_packed_member(ctx, member))
                    .collect::<Result<_>>()?,
            ),
            ast::DeclBody::Union(cases) => resolved::DeclBody::Union(
                cases
                    .into_iter()
                    .map(|case| {
                        Ok(resolved::UnionCase {
                            name: case.name,
                            ty: self.resolve_type(ctx, case.ty)?,
                            position: case.position,
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
        };

        Ok(resolved::TypeDecl {
            identifier: ctx.fresh_identifier(),
            package,
            name,
            body,
            position,
        })
    }

    fn resolve_record_member(
        &self,
        ctx: &GlobalContext,
        member: ast::RecordMember,
    ) -> Result<resolved::RecordMember> {
        Ok(match member {
            ast::RecordMember::Field { name, ty, position } => resolved::RecordMember::Field {
                name,
                ty: self.resolve_type(ctx, ty)?,
                position,
            },
            ast::RecordMember::PaddingOctets { size, position } => {
                resolved::RecordMember::PaddingOctets {
                    size: self.resolve_size(ctx, size)?,
                    position,
                }
            }
        })
    }

    fn resolve_packed_member(
        &self,
        ctx: &GlobalContext,
        member: ast::PackedMember,
    ) -> Result<resolved::PackedMember> {
        Ok(match member {
            ast::PackedMember::Field { name, ty, position } => resolved::PackedMember::Field {
                name,
                ty: self.resolve_type(ctx, ty)?,
                position,
            },
            ast::PackedMember::PaddingBits { size, position } => {
                resolved::PackedMember::PaddingBits {
                    size: self.resolve_size(ctx, size)?,
                    position,
                }
            }
        })
    }

    /// Resolves a type expression against the current scope
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] for unknown types, aliases or fields
    pub fn resolve_type(&self, ctx: &GlobalContext, ty: ast::TypeExpr) -> Result<resolved::TypeExpr> {
        Ok(match ty {
            ast::TypeExpr::Integer {
                kind,
                size,
                position,
            } => resolved::TypeExpr::Integer {
                kind,
                size: self.resolve_size(ctx, size)?,
                position,
            },
            ast::TypeExpr::Float { size, position } => resolved::TypeExpr::Float {
                size: self.resolve_size(ctx, size)?,
                position,
            },
            ast::TypeExpr::Vector {
                element,
                count,
                position,
            } => resolved::TypeExpr::Vector {
                element: Box::new(self.resolve_type(ctx, *element)?),
                count: self.resolve_size(ctx, count)?,
                position,
            },
            ast::TypeExpr::Matrix {
                element,
                width,
                height,
                position,
            } => resolved::TypeExpr::Matrix {
                element: Box::new(self.resolve_type(ctx, *element)?),
                width: self.resolve_size(ctx, width)?,
                height: self.resolve_size(ctx, height)?,
                position,
            },
            ast::TypeExpr::BooleanSet {
                size,
                fields,
                position,
            } => resolved::TypeExpr::BooleanSet {
                size: self.resolve_size(ctx, size)?,
                fields,
                position,
            },
            ast::TypeExpr::String {
                size,
                encoding,
                position,
            } => resolved::TypeExpr::String {
                size: self.resolve_size(ctx, size)?,
                encoding,
                position,
            },
            ast::TypeExpr::Reference(reference) => {
                resolved::TypeExpr::Reference(self.resolve_reference(reference)?)
            }
            ast::TypeExpr::TypeOf {
                reference,
                path,
                position,
            } => {
                let reference = self.resolve_reference(reference)?;
                check_field_path(ctx, &reference, &path, position)?;
                resolved::TypeExpr::TypeOf {
                    reference,
                    path,
                    position,
                }
            }
        })
    }

    /// Resolves a size expression against the current scope
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if a measured type cannot be resolved
    pub fn resolve_size(&self, ctx: &GlobalContext, size: ast::SizeExpr) -> Result<resolved::SizeExpr> {
        Ok(match size {
            ast::SizeExpr::Constant { value, position } => {
                resolved::SizeExpr::Constant { value, position }
            }
            ast::SizeExpr::InOctets { of, position } => resolved::SizeExpr::InOctets {
                of: Box::new(self.resolve_type(ctx, *of)?),
                position,
            },
            ast::SizeExpr::InBits { of, position } => resolved::SizeExpr::InBits {
                of: Box::new(self.resolve_type(ctx, *of)?),
                position,
            },
        })
    }

    fn resolve_reference(&self, reference: ast::TypeReference) -> Result<resolved::TypeReference> {
        let ast::TypeReference {
            package: alias,
            name,
            position,
        } = reference;

        let Some(alias) = alias else {
            let package = self.require_package(position)?.clone();
            return match self.scope.lookup_type(&name) {
                Some(identifier) => Ok(resolved::TypeReference {
                    identifier: identifier.clone(),
                    package,
                    name,
                    position,
                }),
                None => Err(ResolveError::type_nonexistent(
                    name.to_string(),
                    position,
                    &compute_suggestions(
                        name.as_str(),
                        self.scope.type_names().map(TypeName::as_str),
                    ),
                )),
            };
        };

        let imported = self
            .scope
            .lookup_import(&alias)
            .ok_or_else(|| ResolveError::ImportNonexistent {
                alias: alias.clone(),
                position,
            })?;
        if let Some(decl) = imported.get(&name) {
            return Ok(resolved::TypeReference {
                identifier: decl.identifier.clone(),
                package: imported.name().clone(),
                name,
                position,
            });
        }

        let written = format!("{alias}.{name}");
        let candidates: Vec<String> = imported
            .types()
            .keys()
            .map(|candidate| format!("{alias}.{candidate}"))
            .collect();
        let suggestions = compute_suggestions(&written, candidates.iter().map(String::as_str));
        Err(ResolveError::type_nonexistent(written, position, &suggestions))
    }
}

/// Follows a `type-of` path through declared types
fn check_field_path(
    ctx: &GlobalContext,
    reference: &resolved::TypeReference,
    path: &[FieldName],
    position: Position,
) -> Result<()> {
    let mut decl = ctx.get_type(&reference.identifier);
    let mut segments = path.iter().peekable();
    while let Some(field) = segments.next() {
        let ty = decl
            .field_type(field)
            .ok_or_else(|| ResolveError::FieldNonexistent {
                ty: format!("{}.{}", decl.package, decl.name),
                field: field.clone(),
                position,
            })?;
        let Some(&next) = segments.peek() else {
            break;
        };
        match ty {
            Type::User { identifier, .. } => decl = ctx.get_type(identifier),
            other => {
                return Err(ResolveError::FieldPathNotNominal {
                    field: next.clone(),
                    found: other.to_string(),
                    position,
                });
            }
        }
    }
    Ok(())
}
