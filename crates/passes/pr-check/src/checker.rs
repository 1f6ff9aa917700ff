//! Declaration checking and package bookkeeping

use crate::eval::{Placement, TypeEvaluator};
use indexmap::IndexMap;
use num_bigint::BigUint;
use num_traits::Zero;
use pr_context::{CheckError, GlobalContext};
use pr_model::{
    Capabilities, PackageContext, PackageNameQualified, PackedMemberSpec, PackedType,
    RecordField, RecordMember, RecordType, Type, TypeDecl, TypeDeclKind, TypeName, UnionCase,
    UnionType, resolved,
};
use rustc_hash::FxHashSet;
use std::rc::Rc;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, CheckError>;

/// Validates resolved declarations of one file and collects its package
///
/// The checker mirrors the resolver's package lifecycle: declarations are
/// gathered between [`Checker::check_package_begin`] and
/// [`Checker::check_package_end`], which hands out the finished package.
#[derive(Debug)]
pub struct Checker {
    capabilities: Rc<Capabilities>,
    package: Option<PackageNameQualified>,
    types: IndexMap<TypeName, Rc<TypeDecl>>,
}

impl Checker {
    /// Creates a checker consulting `capabilities`
    pub fn new(capabilities: Rc<Capabilities>) -> Self {
        Self {
            capabilities,
            package: None,
            types: IndexMap::new(),
        }
    }

    /// The capability descriptor in use
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Starts collecting declarations for `name`
    pub fn check_package_begin(&mut self, name: &PackageNameQualified) {
        trace!(package = %name, "checker entering package");
        self.package = Some(name.clone());
        self.types.clear();
    }

    /// Finishes `name` and returns every declaration checked since it began
    ///
    /// # Panics
    ///
    /// Panics if `name` is not the package opened by
    /// [`Checker::check_package_begin`]; the resolver rules that out.
    pub fn check_package_end(&mut self, name: &PackageNameQualified) -> PackageContext {
        match self.package.take() {
            Some(open) if &open == name => {}
            other => panic!("checker closing `{name}` while {other:?} is open"),
        }
        let types = std::mem::take(&mut self.types);
        debug!(package = %name, types = types.len(), "package checked");
        PackageContext::new(name.clone(), types)
    }

    /// Checks a declaration and registers it in the global type table
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] if any member violates the capability
    /// descriptor or the declaration is malformed; nothing is registered then
    pub fn check_type_decl(
        &mut self,
        ctx: &mut GlobalContext,
        decl: resolved::TypeDecl,
    ) -> Result<Rc<TypeDecl>> {
        let kind = {
            let eval = TypeEvaluator::new(ctx, &self.capabilities);
            match decl.body {
                resolved::DeclBody::Record(members) => {
                    TypeDeclKind::Record(check_record(&eval, members)?)
                }
                resolved::DeclBody::Packed(members) => TypeDeclKind::Packed(check_packed(
                    &eval,
                    &self.capabilities,
                    &decl.name,
                    decl.position,
                    members,
                )?),
                resolved::DeclBody::Union(cases) => {
                    TypeDeclKind::Union(check_union(&eval, &decl.name, decl.position, cases)?)
                }
            }
        };

        let checked = Rc::new(TypeDecl {
            identifier: decl.identifier,
            package: decl.package,
            name: decl.name,
            position: decl.position,
            kind,
        });
        debug!(
            ty = %checked.name,
            identifier = %checked.identifier,
            kind = checked.keyword(),
            size_bits = %checked.size_in_bits(),
            "declaration checked"
        );
        ctx.put_type(checked.identifier.clone(), Rc::clone(&checked));
        self.types.insert(checked.name.clone(), Rc::clone(&checked));
        Ok(checked)
    }

    /// Checks the expression of a `:type` command
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] if the expression does not check
    pub fn check_command_type(
        &self,
        ctx: &GlobalContext,
        ty: &resolved::TypeExpr,
    ) -> Result<Type> {
        TypeEvaluator::new(ctx, &self.capabilities).check_type(ty, Placement::Record)
    }

    /// Evaluates the expression of a `:size` command
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] if a measured type does not check
    pub fn check_command_size(
        &self,
        ctx: &GlobalContext,
        size: &resolved::SizeExpr,
    ) -> Result<BigUint> {
        TypeEvaluator::new(ctx, &self.capabilities).eval_size(size)
    }
}

fn check_record(eval: &TypeEvaluator<'_>, members: Vec<resolved::RecordMember>) -> Result<RecordType> {
    let mut checked = Vec::with_capacity(members.len());
    let mut names = FxHashSet::default();
    let mut offset = BigUint::zero();

    for member in members {
        match member {
            resolved::RecordMember::Field { name, ty, position } => {
                if !names.insert(name.clone()) {
                    return Err(CheckError::FieldNameDuplicate { name, position });
                }
                let ty = eval.check_type(&ty, Placement::Record)?;
                let bits = ty.size_in_bits();
                if !(&bits % 8u32).is_zero() {
                    return Err(CheckError::SizeNotOctets { bits, position });
                }
                let size_octets = bits / 8u32;
                checked.push(RecordMember::Field(RecordField {
                    name,
                    ty,
                    offset_octets: offset.clone(),
                    position,
                }));
                offset += size_octets;
            }
            resolved::RecordMember::PaddingOctets { size, position } => {
                let size_octets = eval.eval_size(&size)?;
                if size_octets.is_zero() {
                    return Err(CheckError::SizeZero {
                        what: "padding",
                        position,
                    });
                }
                checked.push(RecordMember::Padding {
                    offset_octets: offset.clone(),
                    size_octets: size_octets.clone(),
                    position,
                });
                offset += size_octets;
            }
        }
    }

    Ok(RecordType::new(checked, offset))
}

fn check_packed(
    eval: &TypeEvaluator<'_>,
    capabilities: &Capabilities,
    name: &TypeName,
    position: pr_span::Position,
    members: Vec<resolved::PackedMember>,
) -> Result<PackedType> {
    let mut specs = Vec::with_capacity(members.len());
    let mut names = FxHashSet::default();

    for member in members {
        match member {
            resolved::PackedMember::Field {
                name: field,
                ty,
                position,
            } => {
                if !names.insert(field.clone()) {
                    return Err(CheckError::FieldNameDuplicate {
                        name: field,
                        position,
                    });
                }
                let ty = eval.check_type(&ty, Placement::Packed)?;
                if !ty.is_integer() {
                    return Err(CheckError::PackedFieldNotInteger {
                        name: field,
                        found: ty.to_string(),
                        position,
                    });
                }
                specs.push(PackedMemberSpec::Field {
                    name: field,
                    width: ty.size_in_bits(),
                    ty,
                    position,
                });
            }
            resolved::PackedMember::PaddingBits { size, position } => {
                let width = eval.eval_size(&size)?;
                if width.is_zero() {
                    return Err(CheckError::SizeZero {
                        what: "padding",
                        position,
                    });
                }
                specs.push(PackedMemberSpec::Padding { width, position });
            }
        }
    }

    // A packed type without members has size 0 whatever the target supports.
    let empty = specs.is_empty();
    let packed = PackedType::layout(specs);
    if !empty && !capabilities.is_packed_size_supported(packed.size_in_bits()) {
        return Err(CheckError::PackedSizeUnsupported {
            name: name.clone(),
            size_bits: packed.size_in_bits().clone(),
            supported: capabilities.packed_sizes.to_string(),
            position,
        });
    }
    Ok(packed)
}

fn check_union(
    eval: &TypeEvaluator<'_>,
    name: &TypeName,
    position: pr_span::Position,
    cases: Vec<resolved::UnionCase>,
) -> Result<UnionType> {
    if cases.is_empty() {
        return Err(CheckError::UnionEmpty {
            name: name.clone(),
            position,
        });
    }

    let mut names = FxHashSet::default();
    let mut checked = Vec::with_capacity(cases.len());
    for case in cases {
        if !names.insert(case.name.clone()) {
            return Err(CheckError::CaseNameDuplicate {
                name: case.name,
                position: case.position,
            });
        }
        checked.push(UnionCase {
            ty: eval.check_type(&case.ty, Placement::Record)?,
            name: case.name,
            position: case.position,
        });
    }
    Ok(UnionType::new(checked))
}
