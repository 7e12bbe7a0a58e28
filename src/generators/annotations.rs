//! Typed handle annotations.
//!
//! Raw [`Annotation`]s keep arguments as written. This module binds them to the slots of each family, checks their
//! kinds and yields a [`HandleAnnotation`] or the first [`Diagnostic`] that explains why it cannot.

use handlegen_core::annotations::{self, AnnotationId};

use crate::diagnostics::{Diagnostic, errors};
use crate::model::{Annotation, AnnotationArg};

use super::emit;

/// A validated path-shaped type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub path: syn::Path,
}

/// A release expression that parsed as a Rust expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseExpr {
    pub text: String,
    pub expr: syn::Expr,
}

/// Slots of `#[auto_handle(interface?, underlying?)]`.
pub const AUTO_HANDLE_SLOTS: &[&str] = &["interface", "underlying"];

/// Slots of `#[auto_safe_handle(release?, plain, base?, underlying?)]`.
pub const AUTO_SAFE_HANDLE_SLOTS: &[&str] = &["release", "plain", "base", "underlying"];

/// A handle annotation with its arguments bound and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleAnnotation {
    AutoHandle {
        interface: Option<TypeRef>,
        underlying: Option<TypeRef>,
    },
    AutoSafeHandle {
        release: Option<ReleaseExpr>,
        plain: TypeRef,
        base: Option<TypeRef>,
        underlying: Option<TypeRef>,
    },
}

/// Parse `#[auto_handle(..)]`.
pub fn parse_auto_handle(ann: &Annotation) -> Result<HandleAnnotation, Diagnostic> {
    let name = annotations::as_str(AnnotationId::AutoHandle);
    let slots = bind_slots(ann, name, AUTO_HANDLE_SLOTS)?;
    Ok(HandleAnnotation::AutoHandle {
        interface: type_arg(ann, name, 1, "interface", slots[0])?,
        underlying: type_arg(ann, name, 2, "underlying type", slots[1])?,
    })
}

/// Parse `#[auto_safe_handle(..)]`.
pub fn parse_auto_safe_handle(ann: &Annotation) -> Result<HandleAnnotation, Diagnostic> {
    let name = annotations::as_str(AnnotationId::AutoSafeHandle);
    let slots = bind_slots(ann, name, AUTO_SAFE_HANDLE_SLOTS)?;
    let release = release_arg(ann, name, slots[0])?;
    let plain = type_arg(ann, name, 2, "plain handle type", slots[1])?.ok_or_else(|| {
        errors::missing_annotation_argument(ann.location.clone(), name, "a plain handle type as its second argument")
    })?;
    Ok(HandleAnnotation::AutoSafeHandle {
        release,
        plain,
        base: type_arg(ann, name, 3, "base type", slots[2])?,
        underlying: type_arg(ann, name, 4, "underlying type", slots[3])?,
    })
}

/// Assign positional and named arguments to slots. Omitted slots stay `None`.
fn bind_slots<'a>(
    ann: &'a Annotation,
    name: &str,
    slots: &[&str],
) -> Result<Vec<Option<&'a AnnotationArg>>, Diagnostic> {
    if let Some(AnnotationArg::Malformed { text, reason }) =
        ann.args.iter().find(|a| matches!(a, AnnotationArg::Malformed { .. }))
    {
        return Err(errors::malformed_annotation_arguments(ann.location.clone(), name, text, reason));
    }
    let positional: Vec<&AnnotationArg> = ann.positional().collect();
    if positional.len() > slots.len() {
        return Err(errors::too_many_annotation_arguments(
            ann.location.clone(),
            name,
            slots.len(),
            positional.len(),
        ));
    }
    let mut bound: Vec<Option<&AnnotationArg>> = vec![None; slots.len()];
    for (i, arg) in positional.into_iter().enumerate() {
        bound[i] = Some(arg);
    }
    for arg in &ann.args {
        let AnnotationArg::Named { name: key, value } = arg else {
            continue;
        };
        let Some(index) = slots.iter().position(|s| *s == key.as_str()) else {
            return Err(errors::unknown_annotation_argument(ann.location.clone(), name, key, slots));
        };
        if bound[index].is_some_and(|a| *a != AnnotationArg::Omitted) {
            return Err(errors::invalid_annotation_argument(
                ann.location.clone(),
                name,
                index + 1,
                "single value",
                "a second value",
            ));
        }
        bound[index] = Some(value.as_ref());
    }
    Ok(bound)
}

fn type_arg(
    ann: &Annotation,
    name: &str,
    position: usize,
    role: &str,
    arg: Option<&AnnotationArg>,
) -> Result<Option<TypeRef>, Diagnostic> {
    match arg {
        None | Some(AnnotationArg::Omitted) => Ok(None),
        Some(AnnotationArg::Type(text)) => match emit::parse_type_path(text) {
            Ok(path) => Ok(Some(TypeRef {
                text: text.clone(),
                path,
            })),
            Err(_) => Err(errors::invalid_type_reference(ann.location.clone(), role, text)),
        },
        Some(other) => Err(errors::invalid_annotation_argument(
            ann.location.clone(),
            name,
            position,
            "type",
            other.kind_name(),
        )),
    }
}

fn release_arg(ann: &Annotation, name: &str, arg: Option<&AnnotationArg>) -> Result<Option<ReleaseExpr>, Diagnostic> {
    match arg {
        None | Some(AnnotationArg::Omitted) => Ok(None),
        Some(AnnotationArg::Str(text)) => match syn::parse_str::<syn::Expr>(text) {
            Ok(expr) => Ok(Some(ReleaseExpr {
                text: text.clone(),
                expr,
            })),
            Err(e) => Err(errors::invalid_release_expression(
                ann.location.clone(),
                text,
                &e.to_string(),
            )),
        },
        Some(other) => Err(errors::invalid_annotation_argument(
            ann.location.clone(),
            name,
            1,
            "string literal",
            other.kind_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use std::sync::Arc;

    fn ann(name: &str, args: Vec<AnnotationArg>) -> Annotation {
        let file: Arc<str> = Arc::from("decls.rs");
        Annotation {
            name: name.to_string(),
            args,
            location: Location::whole_file(&file),
        }
    }

    fn ty(text: &str) -> AnnotationArg {
        AnnotationArg::Type(text.to_string())
    }

    #[test]
    fn auto_handle_defaults_when_empty() {
        let parsed = parse_auto_handle(&ann("auto_handle", vec![])).expect("valid");
        assert_eq!(
            parsed,
            HandleAnnotation::AutoHandle {
                interface: None,
                underlying: None
            }
        );
    }

    #[test]
    fn auto_handle_binds_positional_and_named() {
        let parsed = parse_auto_handle(&ann(
            "auto_handle",
            vec![
                AnnotationArg::Omitted,
                AnnotationArg::Named {
                    name: "underlying".into(),
                    value: Box::new(ty("HGDIOBJ")),
                },
            ],
        ))
        .expect("valid");
        let HandleAnnotation::AutoHandle { interface, underlying } = parsed else {
            panic!("wrong family");
        };
        assert!(interface.is_none());
        assert_eq!(underlying.map(|t| t.text), Some("HGDIOBJ".to_string()));
    }

    #[test]
    fn auto_handle_rejects_bad_arguments() {
        let err = parse_auto_handle(&ann("auto_handle", vec![AnnotationArg::Str("HANDLE".into())]))
            .expect_err("string is not a type");
        assert_eq!(err.code, "HGEN004");

        let err = parse_auto_handle(&ann("auto_handle", vec![ty("&str")])).expect_err("not a type path");
        assert_eq!(err.code, "HGEN002");

        let err = parse_auto_handle(&ann("auto_handle", vec![ty("A"), ty("B"), ty("C")])).expect_err("too many");
        assert_eq!(err.code, "HGEN004");

        let err = parse_auto_handle(&ann(
            "auto_handle",
            vec![AnnotationArg::Named {
                name: "parent".into(),
                value: Box::new(ty("A")),
            }],
        ))
        .expect_err("unknown name");
        assert_eq!(err.code, "HGEN004");

        let err = parse_auto_handle(&ann(
            "auto_handle",
            vec![
                ty("A"),
                AnnotationArg::Named {
                    name: "interface".into(),
                    value: Box::new(ty("B")),
                },
            ],
        ))
        .expect_err("given twice");
        assert_eq!(err.code, "HGEN004");
    }

    #[test]
    fn malformed_argument_lists_are_reported() {
        let malformed = AnnotationArg::Malformed {
            text: "HANDLE HANDLE".into(),
            reason: "expected `,`".into(),
        };
        let err = parse_auto_handle(&ann("auto_handle", vec![malformed.clone()])).expect_err("unreadable");
        assert_eq!(err.code, "HGEN004");
        assert!(err.message.contains("expected `,`"), "{}", err.message);
        assert_eq!(err.notes, vec!["found `HANDLE HANDLE`".to_string()]);

        let err = parse_auto_safe_handle(&ann("auto_safe_handle", vec![malformed])).expect_err("unreadable");
        assert_eq!(err.code, "HGEN004");
    }

    #[test]
    fn safe_handle_full_form() {
        let parsed = parse_auto_safe_handle(&ann(
            "AutoSafeHandleAttribute",
            vec![
                AnnotationArg::Str("CloseTest(handle)".into()),
                ty("HTEST"),
                ty("SafeHandleV"),
                ty("HANDLE"),
            ],
        ))
        .expect("valid");
        let HandleAnnotation::AutoSafeHandle {
            release,
            plain,
            base,
            underlying,
        } = parsed
        else {
            panic!("wrong family");
        };
        assert_eq!(release.map(|r| r.text), Some("CloseTest(handle)".to_string()));
        assert_eq!(plain.text, "HTEST");
        assert_eq!(base.map(|b| b.text), Some("SafeHandleV".to_string()));
        assert_eq!(underlying.map(|u| u.text), Some("HANDLE".to_string()));
    }

    #[test]
    fn safe_handle_null_release() {
        let parsed = parse_auto_safe_handle(&ann("auto_safe_handle", vec![AnnotationArg::Omitted, ty("HSAMPLE")]))
            .expect("valid");
        assert!(matches!(parsed, HandleAnnotation::AutoSafeHandle { release: None, .. }));
    }

    #[test]
    fn safe_handle_errors() {
        let err = parse_auto_safe_handle(&ann("auto_safe_handle", vec![AnnotationArg::Omitted]))
            .expect_err("plain missing");
        assert_eq!(err.code, "HGEN005");

        let err = parse_auto_safe_handle(&ann("auto_safe_handle", vec![]))
            .expect_err("plain missing");
        assert_eq!(err.code, "HGEN005");

        let err = parse_auto_safe_handle(&ann(
            "auto_safe_handle",
            vec![AnnotationArg::Str("CloseTest(".into()), ty("HTEST")],
        ))
        .expect_err("bad expression");
        assert_eq!(err.code, "HGEN006");

        let err = parse_auto_safe_handle(&ann(
            "auto_safe_handle",
            vec![AnnotationArg::Expr("close(handle)".into()), ty("HTEST")],
        ))
        .expect_err("unquoted expression");
        assert_eq!(err.code, "HGEN004");
    }
}
