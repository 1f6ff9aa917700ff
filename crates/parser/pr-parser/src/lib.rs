//! Statement parser
//!
//! Gives meaning to the generic expression trees produced by [`pr_sexpr`].
//! Each top-level expression becomes one [`Statement`] of the unresolved
//! tree; names are validated here, references are left for the resolver.

pub mod error;

pub use error::ParseError;

use num_bigint::BigUint;
use pr_model::ast::{
    DeclBody, PackedMember, RecordMember, SizeExpr, Statement, TypeDecl, TypeExpr, TypeReference,
    UnionCase,
};
use pr_model::{FieldName, IntegerKind, NameError, TypeName};
use pr_sexpr::{SExpr, SExprKind};
use pr_span::Position;
use std::str::FromStr;

type Result<T> = std::result::Result<T, ParseError>;

/// A round list whose first element is a keyword
struct Form<'a> {
    keyword: &'a str,
    args: &'a [SExpr],
    position: Position,
}

impl<'a> Form<'a> {
    fn of(expr: &'a SExpr, expected: &'static str) -> Result<Self> {
        let items = expr.as_list().ok_or_else(|| unexpected(expected, expr))?;
        let Some((head, args)) = items.split_first() else {
            return Err(ParseError::Expected {
                expected,
                found: "empty list".to_owned(),
                position: expr.position,
            });
        };
        let keyword = head.as_atom().ok_or_else(|| unexpected("keyword", head))?;
        Ok(Self {
            keyword,
            args,
            position: expr.position,
        })
    }

    fn arguments<const N: usize>(&self) -> Result<&'a [SExpr; N]> {
        self.args.try_into().map_err(|_| ParseError::Arity {
            form: self.keyword.to_owned(),
            expected: N,
            found: self.args.len(),
            position: self.position,
        })
    }
}

fn unexpected(expected: &'static str, expr: &SExpr) -> ParseError {
    ParseError::Expected {
        expected,
        found: format!("{} `{expr}`", expr.describe()),
        position: expr.position,
    }
}

fn name<N>(expr: &SExpr, expected: &'static str) -> Result<N>
where
    N: FromStr<Err = NameError>,
{
    let text = expr.as_atom().ok_or_else(|| unexpected(expected, expr))?;
    text.parse().map_err(|error| ParseError::InvalidName {
        error,
        position: expr.position,
    })
}

/// Parses one top-level expression into a statement
///
/// # Errors
///
/// Returns a [`ParseError`] if the expression is not a statement of the
/// schema language
pub fn parse_statement(expr: &SExpr) -> Result<Statement> {
    let form = Form::of(expr, "statement")?;
    let position = form.position;

    match form.keyword {
        "package-begin" => {
            let [package] = form.arguments::<1>()?;
            Ok(Statement::PackageBegin {
                name: name(package, "package name")?,
                position,
            })
        }
        "package-end" => {
            form.arguments::<0>()?;
            Ok(Statement::PackageEnd { position })
        }
        "import" => {
            let [package, keyword, alias] = form.arguments::<3>()?;
            if keyword.as_atom() != Some("as") {
                return Err(unexpected("`as`", keyword));
            }
            Ok(Statement::Import {
                package: name(package, "package name")?,
                alias: name(alias, "import alias")?,
                position,
            })
        }
        "record" => parse_type_decl(&form, record_body).map(Statement::TypeDecl),
        "packed" => parse_type_decl(&form, packed_body).map(Statement::TypeDecl),
        "union" => parse_type_decl(&form, union_body).map(Statement::TypeDecl),
        ":type" => {
            let [ty] = form.arguments::<1>()?;
            Ok(Statement::CommandType {
                ty: parse_type(ty)?,
                position,
            })
        }
        ":size" => {
            let [size] = form.arguments::<1>()?;
            Ok(Statement::CommandSize {
                size: parse_size(size)?,
                position,
            })
        }
        other => Err(ParseError::UnknownStatement {
            keyword: other.to_owned(),
            position,
        }),
    }
}

fn parse_type_decl(form: &Form<'_>, body: fn(&[SExpr]) -> Result<DeclBody>) -> Result<TypeDecl> {
    let [type_name, members] = form.arguments::<2>()?;
    let name = name(type_name, "type name")?;
    let members = members
        .as_square_list()
        .ok_or_else(|| unexpected("member list in `[...]`", members))?;
    Ok(TypeDecl {
        name,
        body: body(members)?,
        position: form.position,
    })
}

fn record_body(members: &[SExpr]) -> Result<DeclBody> {
    members
        .iter()
        .map(|member| {
            let form = Form::of(member, "record member")?;
            match form.keyword {
                "field" => {
                    let [field, ty] = form.arguments::<2>()?;
                    Ok(RecordMember::Field {
                        name: name(field, "field name")?,
                        ty: parse_type(ty)?,
                        position: form.position,
                    })
                }
                "padding-octets" => {
                    let [size] = form.arguments::<1>()?;
                    Ok(RecordMember::PaddingOctets {
                        size: parse_size(size)?,
                        position: form.position,
                    })
                }
                other => Err(ParseError::UnknownMember {
                    keyword: other.to_owned(),
                    declaration: "record",
                    position: form.position,
                }),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(DeclBody::Record)
}

fn packed_body(members: &[SExpr]) -> Result<DeclBody> {
    members
        .iter()
        .map(|member| {
            let form = Form::of(member, "packed member")?;
            match form.keyword {
                "field" => {
                    let [field, ty] = form.arguments::<2>()?;
                    Ok(PackedMember::Field {
                        name: name(field, "field name")?,
                        ty: parse_type(ty)?,
                        position: form.position,
                    })
                }
                "padding-bits" => {
                    let [size] = form.arguments::<1>()?;
                    Ok(PackedMember::PaddingBits {
                        size: parse_size(size)?,
                        position: form.position,
                    })
                }
                other => Err(ParseError::UnknownMember {
                    keyword: other.to_owned(),
                    declaration: "packed record",
                    position: form.position,
                }),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(DeclBody::Packed)
}

fn union_body(members: &[SExpr]) -> Result<DeclBody> {
    members
        .iter()
        .map(|member| {
            let form = Form::of(member, "union case")?;
            if form.keyword != "case" {
                return Err(ParseError::UnknownMember {
                    keyword: form.keyword.to_owned(),
                    declaration: "union",
                    position: form.position,
                });
            }
            let [case, ty] = form.arguments::<2>()?;
            Ok(UnionCase {
                name: name(case, "case name")?,
                ty: parse_type(ty)?,
                position: form.position,
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(DeclBody::Union)
}

/// Parses a type expression
///
/// # Errors
///
/// Returns a [`ParseError`] if `expr` is not a type expression
pub fn parse_type(expr: &SExpr) -> Result<TypeExpr> {
    match &expr.kind {
        SExprKind::Atom(_) => parse_reference(expr).map(TypeExpr::Reference),
        SExprKind::List(_) => {
            let form = Form::of(expr, "type")?;
            let position = form.position;
            match form.keyword {
                "integer" => {
                    let [kind, size] = form.arguments::<2>()?;
                    let keyword = kind
                        .as_atom()
                        .ok_or_else(|| unexpected("integer kind", kind))?;
                    let kind =
                        IntegerKind::from_keyword(keyword).ok_or_else(|| ParseError::IntegerKind {
                            kind: keyword.to_owned(),
                            position: kind.position,
                        })?;
                    Ok(TypeExpr::Integer {
                        kind,
                        size: parse_size(size)?,
                        position,
                    })
                }
                "float" => {
                    let [size] = form.arguments::<1>()?;
                    Ok(TypeExpr::Float {
                        size: parse_size(size)?,
                        position,
                    })
                }
                "vector" => {
                    let [element, count] = form.arguments::<2>()?;
                    Ok(TypeExpr::Vector {
                        element: Box::new(parse_type(element)?),
                        count: parse_size(count)?,
                        position,
                    })
                }
                "matrix" => {
                    let [element, width, height] = form.arguments::<3>()?;
                    Ok(TypeExpr::Matrix {
                        element: Box::new(parse_type(element)?),
                        width: parse_size(width)?,
                        height: parse_size(height)?,
                        position,
                    })
                }
                "boolean-set" => {
                    let [size, flags] = form.arguments::<2>()?;
                    let flags = flags
                        .as_square_list()
                        .ok_or_else(|| unexpected("flag list in `[...]`", flags))?;
                    let fields = flags
                        .iter()
                        .map(|flag| Ok((name(flag, "flag name")?, flag.position)))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(TypeExpr::BooleanSet {
                        size: parse_size(size)?,
                        fields,
                        position,
                    })
                }
                "string" => {
                    let [size, encoding] = form.arguments::<2>()?;
                    let encoding = encoding
                        .as_quoted()
                        .ok_or_else(|| unexpected("encoding string", encoding))?;
                    Ok(TypeExpr::String {
                        size: parse_size(size)?,
                        encoding: encoding.to_owned(),
                        position,
                    })
                }
                "type-of" => {
                    let [reference, path] = form.arguments::<2>()?;
                    Ok(TypeExpr::TypeOf {
                        reference: parse_reference(reference)?,
                        path: parse_field_path(path)?,
                        position,
                    })
                }
                other => Err(ParseError::UnknownType {
                    keyword: other.to_owned(),
                    position,
                }),
            }
        }
        SExprKind::Quoted(_) | SExprKind::SquareList(_) => Err(unexpected("type", expr)),
    }
}

/// `Name` or `alias.Name`
fn parse_reference(expr: &SExpr) -> Result<TypeReference> {
    let text = expr.as_atom().ok_or_else(|| unexpected("type name", expr))?;
    let invalid = |error| ParseError::InvalidName {
        error,
        position: expr.position,
    };

    let (package, name) = match text.split_once('.') {
        Some((alias, name)) => (Some(alias.parse().map_err(invalid)?), name),
        None => (None, text),
    };
    Ok(TypeReference {
        package,
        name: TypeName::new(name).map_err(invalid)?,
        position: expr.position,
    })
}

fn parse_field_path(expr: &SExpr) -> Result<Vec<FieldName>> {
    let text = expr.as_atom().ok_or_else(|| unexpected("field path", expr))?;
    text.split('.')
        .map(|segment| {
            FieldName::new(segment).map_err(|error| ParseError::InvalidName {
                error,
                position: expr.position,
            })
        })
        .collect()
}

/// Parses a size expression
///
/// # Errors
///
/// Returns a [`ParseError`] if `expr` is not a size expression
pub fn parse_size(expr: &SExpr) -> Result<SizeExpr> {
    match &expr.kind {
        SExprKind::Atom(text) => {
            let value = text
                .bytes()
                .all(|byte| byte.is_ascii_digit())
                .then(|| BigUint::parse_bytes(text.as_bytes(), 10))
                .flatten()
                .ok_or_else(|| ParseError::InvalidSize {
                    text: text.clone(),
                    position: expr.position,
                })?;
            Ok(SizeExpr::Constant {
                value,
                position: expr.position,
            })
        }
        SExprKind::List(_) => {
            let form = Form::of(expr, "size")?;
            match form.keyword {
                "size-in-bits" => {
                    let [of] = form.arguments::<1>()?;
                    Ok(SizeExpr::InBits {
                        of: Box::new(parse_type(of)?),
                        position: form.position,
                    })
                }
                "size-in-octets" => {
                    let [of] = form.arguments::<1>()?;
                    Ok(SizeExpr::InOctets {
                        of: Box::new(parse_type(of)?),
                        position: form.position,
                    })
                }
                other => Err(ParseError::UnknownSize {
                    keyword: other.to_owned(),
                    position: form.position,
                }),
            }
        }
        SExprKind::Quoted(_) | SExprKind::SquareList(_) => Err(unexpected("size", expr)),
    }
}
