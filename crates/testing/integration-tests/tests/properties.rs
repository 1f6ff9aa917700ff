//! Package loading behaviour observed through the file-system loader

use expect_test::expect;
use pr_context::{ErrorKind, GlobalContext, LoadError, ResolveErrorCode};
use pr_driver::FileSystemLoader;
use pr_model::{Capabilities, PackageNameQualified, TypeDeclKind};
use std::fs;
use std::path::Path;
use std::rc::Rc;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn context(root: &Path) -> GlobalContext {
    GlobalContext::new(Rc::new(FileSystemLoader::new(
        root,
        Rc::new(Capabilities::default()),
    )))
}

fn name(text: &str) -> PackageNameQualified {
    text.parse().unwrap()
}

#[test]
fn test_cycle_yields_three_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "x/y/a.prs",
        "(package-begin x.y.a)\n(import x.y.b as b)\n(package-end)\n",
    );
    write(
        dir.path(),
        "x/y/b.prs",
        "(package-begin x.y.b)\n(import x.y.a as a)\n(package-end)\n",
    );

    let mut ctx = context(dir.path());
    let result = ctx.load_package(&name("x.y.a"), None);
    assert_eq!(result.unwrap_err(), LoadError::Failed(name("x.y.a")));

    let errors = ctx.errors();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0].kind(), ErrorKind::CircularImport);
    assert!(errors[0].to_string().contains("Circular import"));
    assert_eq!(errors[1].resolve_code(), Some(ResolveErrorCode::PackageLoadFailed));
    assert_eq!(errors[2].resolve_code(), Some(ResolveErrorCode::PackageLoadFailed));
    expect![[r#"
        Circular import: x.y.a -> x.y.b -> x.y.a
        Error loading package `x.y.a`
        Error loading package `x.y.b`"#]]
    .assert_eq(
        &errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    );

    // The import that closes the cycle is in b, line 2
    let position = errors[0].position().unwrap();
    assert_eq!((position.line, position.column), (2, 1));
    assert!(ctx.package(&name("x.y.a")).is_none());
    assert!(ctx.package(&name("x.y.b")).is_none());
}

#[test]
fn test_nonexistent_package() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    assert!(ctx.load_package(&name("does.not.exist"), None).is_err());
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(
        ctx.errors()[0].resolve_code(),
        Some(ResolveErrorCode::PackageNonexistent)
    );
}

#[test]
fn test_empty_file_is_not_a_package() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "empty.prs", "");
    let mut ctx = context(dir.path());
    assert!(ctx.load_package(&name("empty"), None).is_err());
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(
        ctx.errors()[0].resolve_code(),
        Some(ResolveErrorCode::ExpectedPackage)
    );
}

#[test]
fn test_loaded_package_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "bits.prs",
        "(package-begin bits)
(packed Nibbles [(field f0 (integer signed 4)) (field f1 (integer signed 4))
                 (field f2 (integer signed 4)) (field f3 (integer signed 4))])
(package-end)",
    );
    let mut ctx = context(dir.path());
    let first = ctx.load_package(&name("bits"), None).unwrap();
    let second = ctx.load_package(&name("bits"), None).unwrap();
    assert!(Rc::ptr_eq(&first, &second));

    let nibbles = first.get(&"Nibbles".parse().unwrap()).unwrap();
    let TypeDeclKind::Packed(packed) = &nibbles.kind else {
        panic!("expected a packed type");
    };
    let ranges: Vec<String> = packed
        .fields()
        .map(|field| format!("{} {}", field.name, field.range))
        .collect();
    assert_eq!(ranges, ["f0 [12, 15]", "f1 [8, 11]", "f2 [4, 7]", "f3 [0, 3]"]);
}

#[test]
fn test_cycle_does_not_poison_other_packages() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.prs", "(package-begin ok) (package-end)");
    write(dir.path(), "loop.prs", "(package-begin loop) (import loop as me) (package-end)");

    let mut ctx = context(dir.path());
    assert!(ctx.load_package(&name("ok"), None).is_ok());
    assert!(ctx.load_package(&name("loop"), None).is_err());
    assert!(ctx.package(&name("ok")).is_some());
    let errors = ctx.take_errors();
    assert_eq!(errors[0].to_string(), "Circular import: loop -> loop");
    assert_eq!(errors.len(), 2);
}
