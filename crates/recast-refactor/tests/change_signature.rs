use recast_refactor::{
    change_signature, CancellationToken, ChangeSignatureOptions, Index, MethodSignatureChange,
    ParameterChange, SignatureChangeOutcome, SignatureConflict, SignatureWarning, Visibility,
};
use recast_test_utils::{apply_workspace_edit, build_index};

fn change_for(index: &Index, type_name: &str, method: &str) -> MethodSignatureChange {
    let target = index.methods_of(type_name, method)[0].id;
    MethodSignatureChange::from_declaration(index, target.into()).expect("target resolves")
}

fn run(index: &Index, change: MethodSignatureChange) -> SignatureChangeOutcome {
    recast_test_utils::init_tracing();
    change_signature(index, change, &ChangeSignatureOptions::default()).expect("change succeeds")
}

#[test]
fn unchanged_request_is_rejected_before_any_search() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    int add(int a, int b) {\n        return a + b;\n    }\n}\n",
    )]);
    let change = change_for(&index, "Calc", "add");

    let err = change_signature(&index, change, &ChangeSignatureOptions::default())
        .expect_err("no-op must not run");
    assert_eq!(err.conflicts, vec![SignatureConflict::NoChange]);
}

#[test]
fn rename_and_reorder_updates_declaration_body_and_call_sites() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    int add(int first, int second) {\n        return first + second;\n    }\n    int twice() {\n        return add(1, 2);\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Calc", "add");
    change.new_name = "plus".to_string();
    change.parameters.swap(0, 1);
    change.parameters[1] = change.parameters[1].clone().renamed("count");

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Calc.java"];

    assert!(after.contains("int plus(int second, int count)"));
    assert!(after.contains("return count + second;"));
    assert!(after.contains("return plus(2, 1);"));
    assert!(!outcome
        .warnings
        .iter()
        .any(|w| matches!(w, SignatureWarning::PostEditProblem { .. })));
}

#[test]
fn edited_files_resketch_to_the_requested_signature() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    long mix(int a, String b, double c) {\n        return a;\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Calc", "mix");
    change.parameters.rotate_left(1);
    change.parameters.push(ParameterChange::add("boolean", "strict", Some("false")));

    let outcome = run(&index, change);
    let files = apply_workspace_edit(&index, &outcome.edit);
    let reparsed = Index::new(files);

    let method = reparsed.methods_of("Calc", "mix")[0];
    assert_eq!(
        method.param_types,
        vec!["String", "double", "int", "boolean"]
    );
    assert_eq!(
        method.param_names,
        vec!["b", "c", "a", "strict"]
    );
}

#[test]
fn retained_vararg_absorbs_the_call_tail_when_moved() {
    let index = build_index(&[(
        "Fmt.java",
        "class Fmt {\n    void emit(int level, String... parts) {\n    }\n    void use() {\n        emit(1, \"x\", \"y\");\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Fmt", "emit");
    change.parameters.swap(0, 1);
    change.parameters[0] = change.parameters[0].clone().retyped("String[]");

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Fmt.java"];

    assert!(after.contains("void emit(String[] parts, int level)"));
    assert!(after.contains("emit(\"x\", \"y\", 1);"));
}

#[test]
fn deleting_the_vararg_drops_every_trailing_argument() {
    let index = build_index(&[(
        "Fmt.java",
        "class Fmt {\n    void emit(int level, String... parts) {\n    }\n    void use() {\n        emit(1, \"x\", \"y\");\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Fmt", "emit");
    change.parameters[1] = change.parameters[1].clone().delete();

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Fmt.java"];

    assert!(after.contains("void emit(int level)"));
    assert!(after.contains("emit(1);"));
}

#[test]
fn added_vararg_with_no_default_leaves_call_sites_alone() {
    let index = build_index(&[(
        "Fmt.java",
        "class Fmt {\n    void emit(int level) {\n    }\n    void use() {\n        emit(3);\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Fmt", "emit");
    change.parameters.push(ParameterChange::add("String...", "parts", None));

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Fmt.java"];

    assert!(after.contains("void emit(int level, String... parts)"));
    assert!(after.contains("emit(3);"));
    assert!(!after.contains("import"));
}

#[test]
fn parameter_rename_skips_shadowing_anonymous_class_locals() {
    let index = build_index(&[(
        "Task.java",
        "class Task {\n    void tick(int x) {\n        int y = x + 1;\n        Handler h = new Handler() {\n            void handle() {\n                int x = 0;\n                use(x);\n            }\n        };\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Task", "tick");
    change.parameters[0] = change.parameters[0].clone().renamed("count");

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Task.java"];

    assert!(after.contains("void tick(int count)"));
    assert!(after.contains("int y = count + 1;"));
    assert!(after.contains("int x = 0;"));
    assert!(after.contains("use(x);"));
}

#[test]
fn import_of_a_deleted_parameter_type_is_pruned() {
    let index = build_index(&[(
        "Report.java",
        "package app;\n\nimport java.util.List;\nimport java.util.Map;\n\nclass Report {\n    void fill(List<String> rows, Map<String, Integer> counts) {\n        counts.size();\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Report", "fill");
    change.parameters[0] = change.parameters[0].clone().delete();

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Report.java"];

    assert!(!after.contains("import java.util.List;"));
    assert!(after.contains("import java.util.Map;"));
    assert!(after.contains("void fill(Map<String, Integer> counts)"));
}

#[test]
fn import_still_used_elsewhere_survives_parameter_deletion() {
    let index = build_index(&[(
        "Report.java",
        "package app;\n\nimport java.util.List;\n\nclass Report {\n    List<String> cache;\n\n    void fill(List<String> rows) {\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Report", "fill");
    change.parameters[0] = change.parameters[0].clone().delete();

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Report.java"];

    assert!(after.contains("import java.util.List;"));
    assert!(after.contains("void fill()"));
}

#[test]
fn narrowing_to_private_holds_when_all_references_share_the_type() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    public int half(int n) {\n        return n / 2;\n    }\n    int use() {\n        return half(8);\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Calc", "half");
    change.new_visibility = Visibility::Private;

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Calc.java"];

    assert!(after.contains("private int half(int n)"));
    assert!(!outcome
        .warnings
        .iter()
        .any(|w| matches!(w, SignatureWarning::VisibilityAdjusted { .. })));
}

#[test]
fn cross_package_subclass_use_widens_the_narrowed_method_to_protected() {
    let index = build_index(&[
        (
            "a/Base.java",
            "package a;\n\npublic class Base {\n    public void go() {\n    }\n}\n",
        ),
        (
            "b/Sub.java",
            "package b;\n\nimport a.Base;\n\npublic class Sub extends Base {\n    void f() {\n        go();\n    }\n}\n",
        ),
    ]);
    let mut change = change_for(&index, "Base", "go");
    change.new_visibility = Visibility::Private;

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["a/Base.java"];

    assert!(after.contains("protected void go()"));
    assert!(outcome.warnings.iter().any(|w| matches!(
        w,
        SignatureWarning::VisibilityAdjusted {
            level: Visibility::Protected,
            ..
        }
    )));
}

#[test]
fn helper_called_from_inserted_default_is_widened_to_public() {
    let index = build_index(&[
        (
            "a/Util.java",
            "package a;\n\npublic class Util {\n    static int seed() {\n        return 1;\n    }\n}\n",
        ),
        (
            "b/Job.java",
            "package b;\n\nimport a.Util;\n\npublic class Job {\n    public void go(int n) {\n    }\n    void use() {\n        go(1);\n    }\n}\n",
        ),
    ]);
    let mut change = change_for(&index, "Job", "go");
    change
        .parameters
        .push(ParameterChange::add("int", "seed", Some("Util.seed()")));

    let outcome = run(&index, change);
    let files = apply_workspace_edit(&index, &outcome.edit);

    assert!(files["b/Job.java"].contains("go(1, Util.seed());"));
    assert!(files["a/Util.java"].contains("public static int seed()"));
    assert!(outcome.warnings.iter().any(|w| matches!(
        w,
        SignatureWarning::VisibilityAdjusted {
            level: Visibility::Public,
            ..
        }
    )));
}

#[test]
fn synthesized_chaining_keeps_the_narrowed_constructor_reachable() {
    let index = build_index(&[
        ("Base.java", "class Base {\n    public Base() {\n    }\n}\n"),
        ("Sub.java", "class Sub extends Base {\n}\n"),
    ]);
    let target = index.constructors_of("Base")[0].id;
    let mut change =
        MethodSignatureChange::from_declaration(&index, target.into()).expect("target resolves");
    change.new_visibility = Visibility::Private;
    change
        .parameters
        .push(ParameterChange::add("int", "size", Some("0")));

    let outcome = run(&index, change);
    let files = apply_workspace_edit(&index, &outcome.edit);

    assert!(files["Base.java"].contains("protected Base(int size)"));
    assert!(files["Sub.java"].contains("super(0);"));
    assert!(outcome.warnings.iter().any(|w| matches!(
        w,
        SignatureWarning::VisibilityAdjusted {
            level: Visibility::Protected,
            ..
        }
    )));
}

#[test]
fn unclassifiable_occurrence_aborts_unless_opted_in() {
    let src = "class Buf {\n    int size() {\n        return 0;\n    }\n    void use() {\n        log(size);\n    }\n}\n";
    let index = build_index(&[("Buf.java", src)]);

    let mut change = change_for(&index, "Buf", "size");
    change.new_name = "length".to_string();
    let err = change_signature(&index, change, &ChangeSignatureOptions::default())
        .expect_err("bare name use must abort");
    assert!(err
        .conflicts
        .iter()
        .any(|c| matches!(c, SignatureConflict::UnclassifiableOccurrence { .. })));

    let mut change = change_for(&index, "Buf", "size");
    change.new_name = "length".to_string();
    let options = ChangeSignatureOptions {
        proceed_past_unclassified: true,
        ..ChangeSignatureOptions::default()
    };
    let outcome = change_signature(&index, change, &options).expect("opt-in proceeds");
    let after = &apply_workspace_edit(&index, &outcome.edit)["Buf.java"];
    assert!(after.contains("int length()"));
    assert!(after.contains("log(size);"));
    assert!(outcome.warnings.iter().any(|w| matches!(
        w,
        SignatureWarning::UnclassifiableOccurrence { .. }
    )));
}

#[test]
fn delegate_keeps_the_old_signature_and_forwards_reordered_arguments() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    public int add(int a, int b) {\n        return a + b;\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Calc", "add");
    change.new_name = "plus".to_string();
    change.parameters.swap(0, 1);
    change.delegate = true;
    change.deprecate_delegate = true;

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Calc.java"];

    assert!(after.contains("public int plus(int b, int a)"));
    assert!(after.contains("@Deprecated"));
    assert!(after.contains("public int add(int a, int b)"));
    assert!(after.contains("return plus(b, a);"));
}

#[test]
fn chained_super_call_gains_the_new_constructor_argument() {
    let index = build_index(&[
        ("Base.java", "class Base {\n    Base() {\n    }\n}\n"),
        (
            "Sub.java",
            "class Sub extends Base {\n    Sub(int n) {\n        super();\n    }\n}\n",
        ),
    ]);
    let target = index.constructors_of("Base")[0].id;
    let mut change = MethodSignatureChange::from_declaration(&index, target.into())
        .expect("constructor resolves");
    change.parameters.push(ParameterChange::add("int", "size", Some("7")));

    let outcome = run(&index, change);
    let files = apply_workspace_edit(&index, &outcome.edit);

    assert!(files["Base.java"].contains("Base(int size)"));
    assert!(files["Sub.java"].contains("super(7);"));
}

#[test]
fn subclass_without_constructors_gains_a_synthesized_one() {
    let index = build_index(&[
        ("Base.java", "class Base {\n    Base() {\n    }\n}\n"),
        (
            "Leaf.java",
            "class Leaf extends Base {\n    void noop() {\n    }\n}\n",
        ),
    ]);
    let target = index.constructors_of("Base")[0].id;
    let mut change = MethodSignatureChange::from_declaration(&index, target.into())
        .expect("constructor resolves");
    change.parameters.push(ParameterChange::add("int", "size", Some("0")));

    let outcome = run(&index, change);
    let files = apply_workspace_edit(&index, &outcome.edit);

    assert!(files["Leaf.java"].contains("Leaf() {"));
    assert!(files["Leaf.java"].contains("super(0);"));
}

#[test]
fn javadoc_param_tags_follow_the_new_order_and_added_throws_is_documented() {
    let index = build_index(&[(
        "Doc.java",
        "class Doc {\n    /**\n     * Adds two numbers.\n     *\n     * @param a left\n     * @param b right\n     * @return the sum\n     */\n    int add(int a, int b) {\n        return a + b;\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Doc", "add");
    change.parameters.swap(0, 1);
    change.parameters[1] = change.parameters[1].clone().renamed("left");
    change.exceptions.push(recast_refactor::ExceptionChange::Add {
        ty: "java.io.IOException".to_string(),
    });

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Doc.java"];

    let b_tag = after.find("@param b").expect("b tag survives");
    let left_tag = after.find("@param left").expect("a tag renamed");
    assert!(b_tag < left_tag, "reordered tags follow the new order");
    assert!(after.contains("@throws IOException"));
    assert!(after.contains("int add(int b, int left) throws IOException"));
    assert!(after.contains("import java.io.IOException;"));
}

#[test]
fn exact_overload_collision_is_fatal() {
    let index = build_index(&[(
        "C.java",
        "class C {\n    void f(int a) {\n    }\n    void f(String a) {\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "C", "f");
    change.parameters[0] = change.parameters[0].clone().retyped("String");

    let err = change_signature(&index, change, &ChangeSignatureOptions::default())
        .expect_err("collides with the sibling overload");
    assert!(err
        .conflicts
        .iter()
        .any(|c| matches!(c, SignatureConflict::SignatureClash { .. })));
}

#[test]
fn duplicate_parameter_names_are_fatal() {
    let index = build_index(&[(
        "C.java",
        "class C {\n    void f(int a, int b) {\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "C", "f");
    change.parameters[1] = change.parameters[1].clone().renamed("a");

    let err = change_signature(&index, change, &ChangeSignatureOptions::default())
        .expect_err("two parameters named a");
    assert!(err
        .conflicts
        .iter()
        .any(|c| matches!(c, SignatureConflict::DuplicateParameterName { .. })));
}

#[test]
fn cancelled_run_produces_no_edits() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    int add(int a, int b) {\n        return a + b;\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Calc", "add");
    change.new_name = "plus".to_string();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let options = ChangeSignatureOptions {
        cancel,
        ..ChangeSignatureOptions::default()
    };

    let err = change_signature(&index, change, &options).expect_err("cancelled");
    assert!(err
        .conflicts
        .iter()
        .any(|c| matches!(c, SignatureConflict::Cancelled)));
}

#[test]
fn replayed_descriptor_produces_the_same_edit() {
    let index = build_index(&[(
        "Calc.java",
        "class Calc {\n    int add(int a, int b) {\n        return a + b;\n    }\n    int use() {\n        return add(3, 4);\n    }\n}\n",
    )]);
    let mut change = change_for(&index, "Calc", "add");
    change.new_name = "plus".to_string();
    change.parameters.swap(0, 1);

    let first = run(&index, change);
    let replayed = recast_refactor::replay(
        &index,
        &first.descriptor,
        &ChangeSignatureOptions::default(),
    )
    .expect("replay succeeds");

    assert_eq!(first.edit, replayed.edit);
}

#[test]
fn target_is_resolved_from_a_caret_position() {
    let (src, offset) = recast_test_utils::extract_caret(
        "class Calc {\n    int /*caret*/add(int a, int b) {\n        return a + b;\n    }\n}\n",
    );
    let index = build_index(&[("Calc.java", src.as_str())]);
    let target = index
        .enclosing_method_at("Calc.java", offset)
        .expect("caret sits on a method")
        .id;
    let mut change =
        MethodSignatureChange::from_declaration(&index, target.into()).expect("target resolves");
    change.new_name = "sum".to_string();

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Calc.java"];
    assert!(after.contains("int sum(int a, int b)"));
}

#[test]
fn fixtures_round_trip_through_the_filesystem() {
    let (_dir, paths) = recast_test_utils::fixture_dir(&[(
        "Calc.java",
        "class Calc {\n    int add(int a, int b) {\n        return a + b;\n    }\n}\n",
    )]);
    let text = std::fs::read_to_string(&paths[0]).expect("fixture readable");
    let index = build_index(&[("Calc.java", text.as_str())]);
    let mut change = change_for(&index, "Calc", "add");
    change.parameters.swap(0, 1);

    let outcome = run(&index, change);
    let after = &apply_workspace_edit(&index, &outcome.edit)["Calc.java"];
    assert!(after.contains("int add(int b, int a)"));
}
