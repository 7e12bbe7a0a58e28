//! End-to-end tests: declaration sources and handle files through a full pass

use std::path::{Path, PathBuf};

use handlegen::frontend::{read_additional_file, read_source};
use handlegen::model::AdditionalFile;
use handlegen::{Compilation, Diagnostic, Driver, GeneratorConfig, run_and_update};

fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(relative)
}

fn compilation_of(sources: &[&str]) -> Compilation {
    let sources = sources
        .iter()
        .map(|name| read_source(&fixture(&format!("sources/{name}"))).expect("fixture source is readable"))
        .collect();
    Compilation::new(sources)
}

fn handle_file(name: &str) -> AdditionalFile {
    read_additional_file(&fixture(&format!("handles/{name}"))).expect("fixture file is readable")
}

/// Run one pass with every generator enabled.
fn run(compilation: &Compilation, files: &[AdditionalFile]) -> (Compilation, Vec<Diagnostic>) {
    let driver = Driver::new(GeneratorConfig::default());
    run_and_update(&driver, compilation, files).expect("host succeeds")
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn unit_names(compilation: &Compilation) -> Vec<&str> {
    compilation.generated.iter().map(|u| u.name.as_str()).collect()
}

// ============================================================================
// auto_handle
// ============================================================================

#[test]
fn auto_handle_with_and_without_arguments() {
    let (updated, diagnostics) = run(&compilation_of(&["handles.rs"]), &[]);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(updated.tree_count(), 3);
    insta::assert_debug_snapshot!(unit_names(&updated), @r#"
    [
        "HSAMPLE.handle.g.rs",
        "test32.HPEN.handle.g.rs",
    ]
    "#);

    let pen = &updated.generated[1];
    assert_eq!(pen.module_path, vec!["test32".to_string()]);
    assert!(pen.text.starts_with("// @generated by handlegen"));
    assert!(pen.text.contains("/// Handle to a pen."));
    assert!(pen.text.contains("impl IGraphicsObjectHandle for HPEN {}"), "{}", pen.text);
    assert!(pen.text.contains("impl ::core::convert::From<HPEN> for HGDIOBJ"), "{}", pen.text);
}

// ============================================================================
// auto_safe_handle
// ============================================================================

#[test]
fn auto_safe_handle_with_release_expression_and_null_release() {
    let (updated, diagnostics) = run(&compilation_of(&["safe_handles.rs"]), &[]);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(updated.tree_count(), 3);
    insta::assert_debug_snapshot!(unit_names(&updated), @r#"
    [
        "test32.SafeHTEST.safe_handle.g.rs",
        "SafeHSAMPLE.safe_handle.g.rs",
    ]
    "#);

    let test = &updated.generated[0].text;
    assert!(test.contains("CloseTest(handle)"), "{test}");
    assert!(test.contains("impl ::core::ops::Drop for SafeHTEST"), "{test}");
    let sample = &updated.generated[1].text;
    assert!(sample.contains("NoRelease"), "{sample}");
}

// ============================================================================
// handle files
// ============================================================================

#[test]
fn well_formed_handle_file_yields_one_unit_per_row() {
    let (updated, diagnostics) = run(&Compilation::default(), &[handle_file("good.handles.csv")]);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    insta::assert_debug_snapshot!(unit_names(&updated), @r#"
    [
        "good.handles.HSAMPLE.handle.g.rs",
        "good.handles.HGDIOBJ.handle.g.rs",
        "good.handles.HPEN.handle.g.rs",
        "good.handles.HBRUSH.handle.g.rs",
        "good.handles.HBITMAP.handle.g.rs",
    ]
    "#);
    let pen = &updated.generated[2].text;
    assert!(pen.contains("/// Handle to a pen, used to draw lines."), "{pen}");
}

#[test]
fn missing_field_is_reported_and_processing_continues() {
    let (updated, diagnostics) = run(&Compilation::default(), &[handle_file("bad_field.handles.csv")]);
    insta::assert_debug_snapshot!(codes(&diagnostics), @r#"
    [
        "HGEN001",
    ]
    "#);
    assert_eq!(updated.generated.len(), 2);
}

#[test]
fn invalid_type_token_is_reported() {
    let (updated, diagnostics) = run(&Compilation::default(), &[handle_file("bad_type.handles.csv")]);
    insta::assert_debug_snapshot!(codes(&diagnostics), @r#"
    [
        "HGEN002",
    ]
    "#);
    assert_eq!(updated.generated.len(), 1);
}

#[test]
fn duplicate_name_is_the_first_diagnostic() {
    let (updated, diagnostics) = run(&Compilation::default(), &[handle_file("bad_duplicate.handles.csv")]);
    insta::assert_debug_snapshot!(codes(&diagnostics), @r#"
    [
        "HGEN003",
        "HGEN001",
    ]
    "#);
    assert_eq!(diagnostics[0].notes, vec!["first defined on line 1".to_string()]);
    assert_eq!(updated.generated.len(), 2);
}

#[test]
fn misshaped_first_line_aborts_the_file() {
    let (updated, diagnostics) = run(&Compilation::default(), &[handle_file("bad_shape.handles.csv")]);
    insta::assert_debug_snapshot!(codes(&diagnostics), @r#"
    [
        "HGEN003",
    ]
    "#);
    assert!(updated.generated.is_empty());
}

#[test]
fn files_without_the_suffix_are_ignored() {
    let other = AdditionalFile::new("notes.csv", "not, a, handle, file, at, all\n");
    let (updated, diagnostics) = run(&Compilation::default(), &[other]);
    assert!(diagnostics.is_empty());
    assert!(updated.generated.is_empty());
}

// ============================================================================
// interop adapters
// ============================================================================

#[test]
fn only_adaptable_holders_produce_units() {
    let (updated, diagnostics) = run(&compilation_of(&["interop.rs"]), &[]);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(updated.tree_count(), 4);
    insta::assert_debug_snapshot!(unit_names(&updated), @r#"
    [
        "IUnkHolderIgnore.interop.g.rs",
        "test32.interop.g.rs",
        "test32.IUnkHolder.interop.g.rs",
    ]
    "#);

    let holder = &updated.generated[2].text;
    assert!(holder.contains("pub trait IUnkHolderExt: IUnkHolder {"), "{holder}");
    assert!(holder.contains("fn get_obj_as<T>("), "{holder}");
    assert!(!holder.contains("get_obj2_as"), "{holder}");
    assert!(!holder.contains("ignore"), "{holder}");
}

// ============================================================================
// Whole pass
// ============================================================================

#[test]
fn mixed_pass_runs_every_generator() {
    let compilation = compilation_of(&["handles.rs", "safe_handles.rs", "interop.rs"]);
    let files = [handle_file("good.handles.csv"), handle_file("bad_field.handles.csv")];
    let (updated, diagnostics) = run(&compilation, &files);
    assert_eq!(codes(&diagnostics), vec!["HGEN001"]);
    assert_eq!(updated.generated.len(), 2 + 2 + 5 + 2 + 3);
    assert_eq!(updated.tree_count(), 3 + 14);
}

#[test]
fn passes_are_idempotent() {
    let compilation = compilation_of(&["handles.rs", "safe_handles.rs", "interop.rs"]);
    let files = [handle_file("good.handles.csv"), handle_file("bad_duplicate.handles.csv")];
    let first = run(&compilation, &files);
    let second = run(&compilation, &files);
    assert_eq!(first, second);
}

#[test]
fn diagnostics_render_with_source_snippets() {
    let file = handle_file("bad_type.handles.csv");
    let (_, diagnostics) = run(&Compilation::default(), std::slice::from_ref(&file));
    let rendered = handlegen::diagnostics::render(&diagnostics[0], Some(&file.text));
    assert!(rendered.contains("HGEN002"), "{rendered}");
    assert!(rendered.contains("not a type"), "{rendered}");
}
