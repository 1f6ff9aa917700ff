//! Drives parser, resolver and checker over single statements

use crate::Checker;
use num_bigint::BigUint;
use pr_context::{CheckError, GlobalContext, LoadError, PackageLoader, ResolveError};
use pr_model::{
    Capabilities, PackageContext, PackageNameQualified, Type, TypeDecl, resolved,
};
use pr_resolve::Resolver;
use pr_sexpr::Reader;
use pr_span::{FileId, Position};
use std::rc::Rc;

struct NoPackages;

impl PackageLoader for NoPackages {
    fn load(
        &self,
        ctx: &mut GlobalContext,
        name: &PackageNameQualified,
        importer: Option<Position>,
    ) -> Result<PackageContext, LoadError> {
        ctx.push_error(ResolveError::PackageNonexistent {
            package: name.clone(),
            position: importer,
        });
        Err(LoadError::Failed(name.clone()))
    }
}

/// One file of package `test`
pub(crate) struct Session {
    pub(crate) ctx: GlobalContext,
    resolver: Resolver,
    pub(crate) checker: Checker,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    pub(crate) fn with_capabilities(capabilities: Capabilities) -> Self {
        let mut session = Self {
            ctx: GlobalContext::new(Rc::new(NoPackages)),
            resolver: Resolver::new(),
            checker: Checker::new(Rc::new(capabilities)),
        };
        let resolved::Statement::PackageBegin { name, .. } = session.resolve("(package-begin test)")
        else {
            panic!("expected package-begin");
        };
        session.checker.check_package_begin(&name);
        session
    }

    fn resolve(&mut self, text: &str) -> resolved::Statement {
        let expr = Reader::new(FileId::new(0), text).next().unwrap().unwrap();
        let statement = pr_parser::parse_statement(&expr).unwrap();
        self.resolver.resolve_statement(&mut self.ctx, statement).unwrap()
    }

    /// Checks a declaration and commits it when it passes
    pub(crate) fn declare(&mut self, text: &str) -> Result<Rc<TypeDecl>, CheckError> {
        let resolved::Statement::TypeDecl(decl) = self.resolve(text) else {
            panic!("`{text}` is not a declaration");
        };
        let checked = self.checker.check_type_decl(&mut self.ctx, decl)?;
        self.resolver.commit_type(&checked).unwrap();
        Ok(checked)
    }

    pub(crate) fn command_type(&mut self, text: &str) -> Result<Type, CheckError> {
        let resolved::Statement::CommandType { ty, .. } = self.resolve(&format!("(:type {text})"))
        else {
            panic!("expected a type command");
        };
        self.checker.check_command_type(&self.ctx, &ty)
    }

    pub(crate) fn command_size(&mut self, text: &str) -> Result<BigUint, CheckError> {
        let resolved::Statement::CommandSize { size, .. } = self.resolve(&format!("(:size {text})"))
        else {
            panic!("expected a size command");
        };
        self.checker.check_command_size(&self.ctx, &size)
    }

    pub(crate) fn end(&mut self) -> PackageContext {
        let resolved::Statement::PackageEnd { name, .. } = self.resolve("(package-end)") else {
            panic!("expected package-end");
        };
        self.checker.check_package_end(&name)
    }
}
