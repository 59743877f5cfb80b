//! Module resolver integration tests (spec §8 scenarios 7-8: path-mapping
//! precedence and silent type-only cycles), driven through the public
//! `resolve_and_load` entry point against real scratch files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use vibefun::resolver::{resolve_and_load, ResolveWarning};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vibefun-integration-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn path_mapping_takes_precedence_over_node_modules() {
    let dir = scratch("pathmap");
    write(
        &dir,
        "vibefun.json",
        r#"{ "compilerOptions": { "paths": { "lodash": ["./local/lodash.vf"] } } }"#,
    );
    write(&dir, "local/lodash.vf", "let map = 1;");
    write(&dir, "node_modules/lodash/index.vf", "let map = 2;");
    let entry = write(&dir, "main.vf", "import { map } from \"lodash\";\nlet x = map;");

    let project = resolve_and_load(&entry).expect("resolution should succeed");
    assert_eq!(project.modules.len(), 2);
    assert!(project.modules[0].path.ends_with("local/lodash.vf"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn type_only_cycle_between_two_modules_produces_no_warning() {
    let dir = scratch("typecycle");
    write(&dir, "a.vf", "import type { B } from \"./b\";\ntype A = Int;");
    let entry = write(&dir, "b.vf", "import type { A } from \"./a\";\ntype B = Int;");

    let project = resolve_and_load(&entry).expect("a type-only cycle must not be an error");
    assert!(project.warnings.iter().all(|w| !matches!(w, ResolveWarning::CircularDependency { .. })));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn value_cycle_between_two_modules_produces_a_warning_not_an_error() {
    let dir = scratch("valuecycle");
    write(&dir, "a.vf", "import { b } from \"./b\";\nlet a = 1;");
    let entry = write(&dir, "b.vf", "import { a } from \"./a\";\nlet b = 1;");

    let project = resolve_and_load(&entry).expect("a value cycle is a warning, not an error");
    assert!(project.warnings.iter().any(|w| matches!(w, ResolveWarning::CircularDependency { .. })));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn a_missing_module_is_a_load_error() {
    let dir = scratch("missing");
    let entry = write(&dir, "main.vf", "import { y } from \"./nowhere\";\nlet x = 1;");
    assert!(resolve_and_load(&entry).is_err());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn a_diamond_dependency_loads_each_module_exactly_once() {
    let dir = scratch("diamond");
    write(&dir, "base.vf", "let base = 1;");
    write(&dir, "left.vf", "import { base } from \"./base\";\nlet left = base;");
    write(&dir, "right.vf", "import { base } from \"./base\";\nlet right = base;");
    let entry = write(
        &dir,
        "main.vf",
        "import { left } from \"./left\";\nimport { right } from \"./right\";\nlet x = left;",
    );

    let project = resolve_and_load(&entry).expect("a diamond import graph should resolve cleanly");
    assert_eq!(project.modules.len(), 4);
    let base_pos = project.modules.iter().position(|m| m.path.ends_with("base.vf")).unwrap();
    let main_pos = project.modules.iter().position(|m| m.path.ends_with("main.vf")).unwrap();
    assert!(base_pos < main_pos);

    let _ = fs::remove_dir_all(&dir);
}
