//! Type expression checking and size evaluation

use num_bigint::BigUint;
use num_traits::Zero;
use pr_context::{CheckError, GlobalContext};
use pr_model::{Capabilities, FieldName, Type, resolved};
use pr_span::Position;
use rustc_hash::FxHashSet;

type Result<T> = std::result::Result<T, CheckError>;

/// Which integer widths apply to a type expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Byte-aligned storage: records, unions, vectors, commands
    Record,
    /// A field of a packed record
    Packed,
}

/// Checks type expressions against a capability descriptor
///
/// Every size expression is evaluated on the way; a size that measures a type
/// checks that type first.
#[derive(Debug, Clone, Copy)]
pub struct TypeEvaluator<'a> {
    ctx: &'a GlobalContext,
    capabilities: &'a Capabilities,
}

impl<'a> TypeEvaluator<'a> {
    /// Creates an evaluator reading declarations from `ctx`
    pub fn new(ctx: &'a GlobalContext, capabilities: &'a Capabilities) -> Self {
        Self { ctx, capabilities }
    }

    /// Checks a type expression and computes its semantic type
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] if a size, count, shape or encoding is not
    /// supported or the expression is inconsistent
    pub fn check_type(&self, ty: &resolved::TypeExpr, placement: Placement) -> Result<Type> {
        let caps = self.capabilities;
        match ty {
            resolved::TypeExpr::Integer {
                kind,
                size,
                position,
            } => {
                let size_bits = self.eval_size(size)?;
                nonzero(&size_bits, "integer size", *position)?;
                let (ok, supported, what) = match placement {
                    Placement::Record => (
                        caps.is_record_integer_size_supported(&size_bits),
                        &caps.record_integer_sizes,
                        "integer size",
                    ),
                    Placement::Packed => (
                        caps.is_packed_integer_size_supported(&size_bits),
                        &caps.packed_integer_sizes,
                        "packed integer size",
                    ),
                };
                if !ok {
                    return Err(CheckError::SizeUnsupported {
                        what,
                        value: size_bits.to_string(),
                        supported: supported.to_string(),
                        position: *position,
                    });
                }
                Ok(Type::Integer {
                    kind: *kind,
                    size_bits,
                })
            }
            resolved::TypeExpr::Float { size, position } => {
                let size_bits = self.eval_size(size)?;
                nonzero(&size_bits, "float size", *position)?;
                if !caps.is_float_size_supported(&size_bits) {
                    return Err(CheckError::SizeUnsupported {
                        what: "float size",
                        value: size_bits.to_string(),
                        supported: caps.record_float_sizes.to_string(),
                        position: *position,
                    });
                }
                Ok(Type::Float { size_bits })
            }
            resolved::TypeExpr::Vector {
                element,
                count,
                position,
            } => {
                let element = self.check_element(element)?;
                let count = self.eval_size(count)?;
                let (ok, supported) = if element.is_integer() {
                    (
                        caps.is_integer_vector_count_supported(&count),
                        &caps.vector_integer_counts,
                    )
                } else {
                    (
                        caps.is_float_vector_count_supported(&count),
                        &caps.vector_float_counts,
                    )
                };
                if !ok {
                    return Err(CheckError::SizeUnsupported {
                        what: "vector element count",
                        value: count.to_string(),
                        supported: supported.to_string(),
                        position: *position,
                    });
                }
                Ok(Type::Vector {
                    element: Box::new(element),
                    count,
                })
            }
            resolved::TypeExpr::Matrix {
                element,
                width,
                height,
                position,
            } => {
                let element = self.check_element(element)?;
                let width = self.eval_size(width)?;
                let height = self.eval_size(height)?;
                let (ok, shapes) = if element.is_integer() {
                    (
                        caps.is_integer_matrix_supported(&width, &height),
                        &caps.matrix_integer_shapes,
                    )
                } else {
                    (
                        caps.is_float_matrix_supported(&width, &height),
                        &caps.matrix_float_shapes,
                    )
                };
                if !ok {
                    return Err(CheckError::SizeUnsupported {
                        what: "matrix shape",
                        value: format!("{width}x{height}"),
                        supported: format!(
                            "widths {}; heights {}",
                            shapes.widths, shapes.heights
                        ),
                        position: *position,
                    });
                }
                Ok(Type::Matrix {
                    element: Box::new(element),
                    width,
                    height,
                })
            }
            resolved::TypeExpr::BooleanSet {
                size,
                fields,
                position,
            } => {
                let size_octets = self.eval_size(size)?;
                if !caps.is_boolean_set_size_supported(&size_octets) {
                    return Err(CheckError::SizeUnsupported {
                        what: "boolean set size",
                        value: size_octets.to_string(),
                        supported: caps.boolean_set_sizes.to_string(),
                        position: *position,
                    });
                }
                let mut seen = FxHashSet::default();
                for (name, flag_position) in fields {
                    if !seen.insert(name) {
                        return Err(CheckError::BooleanSetFieldDuplicate {
                            name: name.clone(),
                            position: *flag_position,
                        });
                    }
                }
                if BigUint::from(fields.len()) > &size_octets * 8u32 {
                    return Err(CheckError::BooleanSetTooSmall {
                        flags: fields.len(),
                        size_octets,
                        position: *position,
                    });
                }
                Ok(Type::BooleanSet {
                    fields: fields.iter().map(|(name, _)| name.clone()).collect(),
                    size_octets,
                })
            }
            resolved::TypeExpr::String {
                size,
                encoding,
                position,
            } => {
                let size_octets = self.eval_size(size)?;
                if !caps.is_string_size_supported(&size_octets) {
                    return Err(CheckError::SizeUnsupported {
                        what: "string size",
                        value: size_octets.to_string(),
                        supported: caps.string_sizes.to_string(),
                        position: *position,
                    });
                }
                if !caps.is_string_encoding_supported(encoding) {
                    return Err(CheckError::EncodingUnsupported {
                        encoding: encoding.clone(),
                        supported: caps
                            .string_encodings
                            .iter()
                            .map(String::as_str)
                            .collect::<Vec<_>>()
                            .join(", "),
                        position: *position,
                    });
                }
                Ok(Type::String {
                    encoding: encoding.clone(),
                    size_octets,
                })
            }
            resolved::TypeExpr::Reference(reference) => {
                Ok(self.ctx.get_type(&reference.identifier).as_type())
            }
            resolved::TypeExpr::TypeOf {
                reference, path, ..
            } => Ok(self.field_path_type(reference, path)),
        }
    }

    /// Evaluates a size expression
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] if a measured type does not check, or if an
    /// octet size is taken of a type that is not a whole number of octets
    pub fn eval_size(&self, size: &resolved::SizeExpr) -> Result<BigUint> {
        match size {
            resolved::SizeExpr::Constant { value, .. } => Ok(value.clone()),
            resolved::SizeExpr::InBits { of, .. } => {
                Ok(self.check_type(of, Placement::Record)?.size_in_bits())
            }
            resolved::SizeExpr::InOctets { of, position } => {
                let bits = self.check_type(of, Placement::Record)?.size_in_bits();
                if !(&bits % 8u32).is_zero() {
                    return Err(CheckError::SizeNotOctets {
                        bits,
                        position: *position,
                    });
                }
                Ok(bits / 8u32)
            }
        }
    }

    fn check_element(&self, element: &resolved::TypeExpr) -> Result<Type> {
        let checked = self.check_type(element, Placement::Record)?;
        if !checked.is_scalar() {
            return Err(CheckError::ElementNotScalar {
                found: checked.to_string(),
                position: element.position(),
            });
        }
        Ok(checked)
    }

    fn field_path_type(&self, reference: &resolved::TypeReference, path: &[FieldName]) -> Type {
        let mut current = self.ctx.get_type(&reference.identifier).as_type();
        for field in path {
            let decl = current
                .identifier()
                .map(|identifier| self.ctx.get_type(identifier))
                .unwrap_or_else(|| panic!("resolved field path continues through {current}"));
            current = decl
                .field_type(field)
                .unwrap_or_else(|| panic!("resolved field path names missing field `{field}`"))
                .clone();
        }
        current
    }
}

fn nonzero(value: &BigUint, what: &'static str, position: Position) -> Result<()> {
    if value.is_zero() {
        return Err(CheckError::SizeZero { what, position });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::Session;
    use expect_test::expect;
    use num_bigint::BigUint;
    use pr_context::CheckErrorCode;
    use pr_model::{Capabilities, MatrixShapes, SizeRanges, Type};

    #[test]
    fn test_scalar_sizes_follow_capabilities() {
        let mut session = Session::new();
        assert_eq!(
            session.command_type("(integer signed 32)").unwrap().size_in_bits(),
            BigUint::from(32u32)
        );
        let error = session.command_type("(integer signed 12)").unwrap_err();
        expect!["unsupported integer size 12"].assert_eq(&error.to_string());
        assert_eq!(error.error_code(), CheckErrorCode::SizeUnsupported);

        assert_eq!(
            session.command_type("(float 8)").unwrap_err().error_code(),
            CheckErrorCode::SizeUnsupported
        );
        assert_eq!(
            session.command_type("(integer unsigned 0)").unwrap_err().error_code(),
            CheckErrorCode::SizeZero
        );
    }

    #[test]
    fn test_vectors_and_matrices() {
        let mut session = Session::new();
        let vector = session.command_type("(vector (float 32) 4)").unwrap();
        assert_eq!(vector.size_in_bits(), BigUint::from(128u32));
        assert_eq!(
            session.command_type("(vector (float 32) 5)").unwrap_err().error_code(),
            CheckErrorCode::SizeUnsupported
        );

        let matrix = session.command_type("(matrix (float 64) 3 2)").unwrap();
        assert_eq!(matrix.size_in_bits(), BigUint::from(384u32));

        // No integer matrices by default
        let error = session
            .command_type("(matrix (integer signed 32) 2 2)")
            .unwrap_err();
        expect!["unsupported matrix shape 2x2"].assert_eq(&error.to_string());

        session
            .declare("(record R [(field a (integer unsigned 8))])")
            .unwrap();
        let error = session.command_type("(vector R 2)").unwrap_err();
        expect!["element type test.R is not an integer or float"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_integer_matrix_shapes_from_descriptor() {
        let mut session = Session::with_capabilities(Capabilities {
            matrix_integer_shapes: MatrixShapes {
                widths: SizeRanges::between(2, 2),
                heights: SizeRanges::between(2, 4),
            },
            ..Capabilities::default()
        });
        assert!(session.command_type("(matrix (integer signed 16) 2 4)").is_ok());
        assert!(session.command_type("(matrix (integer signed 16) 3 4)").is_err());
    }

    #[test]
    fn test_vector_counts_depend_on_element_kind() {
        let mut session = Session::with_capabilities(Capabilities {
            vector_integer_counts: SizeRanges::exactly(&[3]),
            vector_float_counts: SizeRanges::exactly(&[2]),
            ..Capabilities::default()
        });
        assert!(session.command_type("(vector (integer signed 32) 3)").is_ok());
        assert!(session.command_type("(vector (float 32) 2)").is_ok());
        assert!(session.command_type("(vector (integer signed 32) 2)").is_err());
        let error = session.command_type("(vector (float 32) 3)").unwrap_err();
        expect!["unsupported vector element count 3"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_boolean_sets() {
        let mut session = Session::new();
        let set = session.command_type("(boolean-set 1 [a b c])").unwrap();
        assert_eq!(set.size_in_bits(), BigUint::from(8u32));
        assert_eq!(
            session.command_type("(boolean-set 1 [a b a])").unwrap_err().error_code(),
            CheckErrorCode::BooleanSetFieldDuplicate
        );
        assert_eq!(
            session
                .command_type("(boolean-set 1 [a b c d e f g h i])")
                .unwrap_err()
                .error_code(),
            CheckErrorCode::BooleanSetTooSmall
        );
        assert_eq!(
            session.command_type("(boolean-set 9 [a])").unwrap_err().error_code(),
            CheckErrorCode::SizeUnsupported
        );
    }

    #[test]
    fn test_strings() {
        let mut session = Session::new();
        assert_eq!(
            session.command_type("(string 32 \"UTF-8\")").unwrap(),
            Type::String {
                encoding: "UTF-8".to_owned(),
                size_octets: BigUint::from(32u32),
            }
        );
        let error = session.command_type("(string 32 \"EBCDIC\")").unwrap_err();
        expect!["unsupported string encoding `EBCDIC`"].assert_eq(&error.to_string());
        assert_eq!(
            session.command_type("(string 0 \"UTF-8\")").unwrap_err().error_code(),
            CheckErrorCode::SizeUnsupported
        );
    }

    #[test]
    fn test_size_expressions() {
        let mut session = Session::new();
        assert_eq!(session.command_size("24").unwrap(), BigUint::from(24u32));
        assert_eq!(
            session.command_size("(size-in-bits (vector (float 32) 3))").unwrap(),
            BigUint::from(96u32)
        );
        assert_eq!(
            session.command_size("(size-in-octets (float 64))").unwrap(),
            BigUint::from(8u32)
        );
        // Sizes may be computed from other types
        assert_eq!(
            session
                .command_type("(integer unsigned (size-in-bits (float 16)))")
                .unwrap()
                .size_in_bits(),
            BigUint::from(16u32)
        );

        session
            .declare("(packed P [(field a (integer unsigned 3)) (padding-bits 5)])")
            .unwrap();
        assert_eq!(session.command_size("(size-in-octets P)").unwrap(), BigUint::from(1u32));
    }

    #[test]
    fn test_octet_size_of_odd_width() {
        let mut session = Session::with_capabilities(Capabilities {
            packed_sizes: SizeRanges::between(1, 64),
            ..Capabilities::default()
        });
        session
            .declare("(packed P [(field a (integer unsigned 3))])")
            .unwrap();
        assert_eq!(session.command_size("(size-in-bits P)").unwrap(), BigUint::from(3u32));
        let error = session.command_size("(size-in-octets P)").unwrap_err();
        expect!["size of 3 bits is not a whole number of octets"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_type_of_follows_fields() {
        let mut session = Session::new();
        session
            .declare("(record Inner [(field v (vector (float 32) 2))])")
            .unwrap();
        session
            .declare("(record Outer [(field inner Inner) (field id (integer unsigned 16))])")
            .unwrap();
        assert_eq!(
            session.command_type("(type-of Outer inner.v)").unwrap().to_string(),
            "(vector (float 32) 2)"
        );
        assert_eq!(
            session.command_type("(type-of Outer inner)").unwrap().to_string(),
            "test.Inner"
        );
    }
}
