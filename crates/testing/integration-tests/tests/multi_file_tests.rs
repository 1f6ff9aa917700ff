//! Fixture projects checked end to end through the file-system loader

use integration_tests::multi_file::{self, TestResult};

fn assert_pass(result: TestResult) {
    if let TestResult::Fail { reason } = result {
        panic!("{reason}");
    }
}

#[test]
fn test_circular_imports() {
    assert_pass(multi_file::circular_imports().run());
}

#[test]
fn test_shapes_library() {
    assert_pass(multi_file::shapes_library().run());
}

#[test]
fn test_errors_in_an_import_are_reported_once() {
    let mut project = multi_file::create_project("broken-import");
    project.add_package(
        "lib.base",
        "(package-begin lib.base)
(record Word [(field w (integer unsigned 24))])
(package-end)
",
    );
    project.add_package(
        "app",
        "(package-begin app)
(import lib.base as base)
(record Uses [(field w base.Word)])
(package-end)
",
    );
    project.check_package("app");
    project.check_package("lib.base");
    project.expect_errors([
        "unsupported integer size 24",
        "Error loading package `lib.base`",
        // Failed loads are not cached, so the second request reports it again
        "unsupported integer size 24",
    ]);
    assert_pass(project.run());
}

#[test]
fn test_rejected_declaration_is_not_visible() {
    let mut project = multi_file::create_project("rejected-declaration");
    project.add_package(
        "app",
        "(package-begin app)
(record Bad [(field f (float 12))])
(record Uses [(field b Bad)])
(record Fine [(field f (float 16))])
(package-end)
",
    );
    project.check_package("app");
    project.expect_errors(["unsupported float size 12", "type `Bad` does not exist"]);
    assert_pass(project.run());
}

#[test]
fn test_custom_capabilities() {
    let mut project = multi_file::create_project("custom-capabilities");
    project.capabilities = pr_model::Capabilities::from_toml_str(
        r#"
record_integer_sizes = [8, { lower = 16, upper = 128 }]
string_encodings = ["UTF-8", "UTF-16"]
"#,
    )
    .unwrap();
    project.add_package(
        "wide",
        "(package-begin wide)
(record Wide [(field v (integer signed 96)) (field s (string 8 \"UTF-16\"))])
(package-end)
",
    );
    project.check_package("wide");
    assert_pass(project.run());
}
