//! Per-file statement pipeline

use num_bigint::BigUint;
use pr_check::Checker;
use pr_context::{GlobalContext, LoadError, ResolveError, ResolveErrorCode};
use pr_model::{Capabilities, PackageContext, PackageNameQualified, Type, resolved};
use pr_resolve::Resolver;
use pr_sexpr::{Reader, SExpr};
use pr_span::{FileId, Position};
use std::rc::Rc;
use tracing::{info, trace};

/// The current file cannot be processed any further
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

/// Output of a `:type` or `:size` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The checked type
    Type(Type),
    /// The evaluated size
    Size(BigUint),
}

/// Takes the top-level expressions of one file through every pass
///
/// Errors are queued on the [`GlobalContext`] and processing carries on with
/// the next expression, except after a failed import.
#[derive(Debug)]
pub struct Pipeline {
    resolver: Resolver,
    checker: Checker,
    results: Vec<CommandResult>,
}

impl Pipeline {
    /// Creates a pipeline for a new file
    pub fn new(capabilities: Rc<Capabilities>) -> Self {
        Self {
            resolver: Resolver::new(),
            checker: Checker::new(capabilities),
            results: Vec::new(),
        }
    }

    /// Processes one top-level expression
    ///
    /// Returns the finished package when `expr` closes it.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] if an import failed; the reason is already queued
    pub fn on_expression(
        &mut self,
        ctx: &mut GlobalContext,
        expr: &SExpr,
    ) -> Result<Option<PackageContext>, Abort> {
        trace!(position = %expr.position, "pipeline expression");
        let statement = match pr_parser::parse_statement(expr) {
            Ok(statement) => statement,
            Err(error) => {
                ctx.push_error(error);
                return Ok(None);
            }
        };

        let statement = match self.resolver.resolve_statement(ctx, statement) {
            Ok(statement) => statement,
            Err(error) => {
                let fatal = error.error_code() == ResolveErrorCode::PackageLoadFailed;
                ctx.push_error(error);
                return if fatal { Err(Abort) } else { Ok(None) };
            }
        };

        match statement {
            resolved::Statement::PackageBegin { name, .. } => {
                self.checker.check_package_begin(&name);
            }
            resolved::Statement::PackageEnd { name, .. } => {
                return Ok(Some(self.checker.check_package_end(&name)));
            }
            resolved::Statement::Import { package, .. } => {
                trace!(package = %package, "import bound");
            }
            resolved::Statement::TypeDecl(decl) => match self.checker.check_type_decl(ctx, decl) {
                Ok(checked) => {
                    if let Err(error) = self.resolver.commit_type(&checked) {
                        ctx.push_error(error);
                    }
                }
                Err(error) => ctx.push_error(error),
            },
            resolved::Statement::CommandType { ty, position } => {
                match self.checker.check_command_type(ctx, &ty) {
                    Ok(ty) => {
                        info!(%position, %ty, ":type");
                        self.results.push(CommandResult::Type(ty));
                    }
                    Err(error) => ctx.push_error(error),
                }
            }
            resolved::Statement::CommandSize { size, position } => {
                match self.checker.check_command_size(ctx, &size) {
                    Ok(size) => {
                        info!(%position, %size, ":size");
                        self.results.push(CommandResult::Size(size));
                    }
                    Err(error) => ctx.push_error(error),
                }
            }
        }
        Ok(None)
    }

    /// Finishes the file; `position` is just past its last expression
    pub fn on_eof(&mut self, ctx: &mut GlobalContext, position: Position) {
        trace!(%position, "pipeline end of file");
        if let Err(error) = self.resolver.finish(position) {
            ctx.push_error(error);
        }
    }

    /// Results of the commands processed so far, in order
    pub fn take_results(&mut self) -> Vec<CommandResult> {
        std::mem::take(&mut self.results)
    }
}

/// Compiles the source of package `name` with a fresh [`Pipeline`]
///
/// Reading stops at the first lexical error or failed import; otherwise the
/// end of the file is checked. The source must declare exactly the package
/// that was asked for.
///
/// # Errors
///
/// Returns [`LoadError::Failed`] if no matching package came out of the
/// source; every reason is on the error queue
pub fn compile_source(
    ctx: &mut GlobalContext,
    name: &PackageNameQualified,
    file: FileId,
    text: &str,
    capabilities: Rc<Capabilities>,
) -> Result<PackageContext, LoadError> {
    let mut pipeline = Pipeline::new(capabilities);
    let mut reader = Reader::new(file, text);
    let mut produced: Option<(PackageContext, Position)> = None;
    let mut finished = true;

    for next in reader.by_ref() {
        let expr = match next {
            Ok(expr) => expr,
            Err(error) => {
                ctx.push_error(error);
                finished = false;
                break;
            }
        };
        match pipeline.on_expression(ctx, &expr) {
            Ok(Some(package)) => {
                assert!(produced.is_none(), "one source produced two packages");
                produced = Some((package, expr.position));
            }
            Ok(None) => {}
            Err(Abort) => {
                finished = false;
                break;
            }
        }
    }
    if finished {
        pipeline.on_eof(ctx, reader.eof_position());
    }

    match produced {
        Some((package, _)) if package.name() == name => Ok(package),
        Some((package, position)) => {
            ctx.push_error(ResolveError::PackageUnexpected {
                expected: name.clone(),
                found: package.name().clone(),
                position,
            });
            Err(LoadError::Failed(name.clone()))
        }
        None => Err(LoadError::Failed(name.clone())),
    }
}
