//! Taint engine tests: controller attribution, call-stack dedup,
//! recursion bounds, and dynamic-callee halting.

use auditor_analysis::graph::taint::{TaintEngine, TaintRegistry};
use auditor_core::cancel::CancelToken;
use auditor_core::config::TaintConfig;
use auditor_core::facts::rows::{
    AssignmentRow, CallArgRow, CallRow, FactRow, FileRow, ReturnRow, SymbolRow,
};
use auditor_core::facts::tables::TableId;
use auditor_storage::FactStore;

fn file_row(path: &str) -> FactRow {
    FactRow::File(FileRow {
        path: path.to_string(),
        language: "python".to_string(),
        content_hash: 1,
        file_size: 100,
        framework_tags: String::new(),
        parse_status: "ok".to_string(),
        parse_error: String::new(),
    })
}

fn function_row(file: &str, name: &str, line: u32, end_line: u32, params: &[&str]) -> FactRow {
    FactRow::Symbol(SymbolRow {
        file: file.to_string(),
        line,
        end_line,
        kind: "function".to_string(),
        name: name.to_string(),
        qualified_name: name.to_string(),
        scope: "global".to_string(),
        params: serde_json::to_string(params).unwrap(),
        symbol_id: 0,
    })
}

fn assignment(file: &str, line: u32, function: &str, target: &str, expr: &str, reads: &[&str]) -> FactRow {
    FactRow::Assignment(AssignmentRow {
        file: file.to_string(),
        line,
        in_function: function.to_string(),
        target: target.to_string(),
        expression: expr.to_string(),
        read_vars: serde_json::to_string(reads).unwrap(),
    })
}

fn call(file: &str, line: u32, caller: &str, callee: &str, receiver: &str) -> FactRow {
    FactRow::Call(CallRow {
        file: file.to_string(),
        line,
        caller_function: caller.to_string(),
        callee_name: callee.to_string(),
        receiver: receiver.to_string(),
        argument_count: 1,
        callee_unresolved: false,
        requires_runtime_analysis: false,
    })
}

fn dynamic_call(file: &str, line: u32, caller: &str, callee: &str) -> FactRow {
    FactRow::Call(CallRow {
        file: file.to_string(),
        line,
        caller_function: caller.to_string(),
        callee_name: callee.to_string(),
        receiver: String::new(),
        argument_count: 1,
        callee_unresolved: true,
        requires_runtime_analysis: true,
    })
}

fn arg(file: &str, line: u32, callee: &str, expr: &str, reads: &[&str]) -> FactRow {
    FactRow::CallArg(CallArgRow {
        file: file.to_string(),
        line,
        callee_name: callee.to_string(),
        arg_index: 0,
        keyword: String::new(),
        expression: expr.to_string(),
        read_vars: serde_json::to_string(reads).unwrap(),
    })
}

fn insert(store: &FactStore, table: TableId, rows: Vec<FactRow>) {
    store.write_rows(table, rows).unwrap();
}

fn run_engine(store: &FactStore) -> auditor_analysis::graph::taint::TaintReport {
    let engine = TaintEngine::new(
        store,
        TaintRegistry::with_defaults(),
        TaintConfig::default(),
        CancelToken::new(),
    );
    engine.run().unwrap()
}

/// Two handlers in different files call the same helper which reaches
/// the sink: two distinct paths, one per controller.
#[test]
fn controller_attribution_is_preserved() {
    let store = FactStore::open_in_memory().unwrap();

    insert(&store, TableId::Files, vec![
        file_row("h1.py"),
        file_row("h2.py"),
        file_row("helper.py"),
    ]);
    insert(&store, TableId::Symbols, vec![
        function_row("h1.py", "h1", 1, 5, &["req"]),
        function_row("h2.py", "h2", 1, 5, &["req"]),
        function_row("helper.py", "render", 1, 3, &["x"]),
    ]);
    insert(&store, TableId::Assignments, vec![
        assignment("h1.py", 2, "h1", "x", "request.args.get('q')", &["request"]),
        assignment("h2.py", 2, "h2", "x", "request.args.get('q')", &["request"]),
    ]);
    insert(&store, TableId::Calls, vec![
        call("h1.py", 3, "h1", "render", ""),
        call("h2.py", 3, "h2", "render", ""),
        call("helper.py", 2, "render", "execute", "cursor"),
    ]);
    insert(&store, TableId::CallArgs, vec![
        arg("h1.py", 3, "render", "x", &["x"]),
        arg("h2.py", 3, "render", "x", &["x"]),
        arg("helper.py", 2, "execute", "x", &["x"]),
    ]);

    let report = run_engine(&store);

    assert_eq!(report.paths.len(), 2, "one path per controller");
    let first_frames: Vec<&str> = report
        .paths
        .iter()
        .map(|p| p.call_stack[0].function.as_str())
        .collect();
    assert!(first_frames.contains(&"h1"));
    assert!(first_frames.contains(&"h2"));

    for path in &report.paths {
        // The final frame's function contains the sink site.
        let last = path.call_stack.last().unwrap();
        assert_eq!(last.function, path.sink.function);
        assert_eq!(last.line, path.sink.line);
        assert_eq!(path.sink.expression, "cursor.execute");
        assert_eq!(path.sink.kind, "sql");
    }

    // Same source+sink pair never repeats a call stack.
    for (i, p) in report.paths.iter().enumerate() {
        for q in &report.paths[i + 1..] {
            if p.source.file == q.source.file
                && p.source.line == q.source.line
                && p.sink.file == q.sink.file
                && p.sink.line == q.sink.line
            {
                assert_ne!(p.call_stack, q.call_stack);
            }
        }
    }
}

/// One source reaching one sink through two different intermediaries:
/// both paths survive because the dedup key includes the stack.
#[test]
fn same_source_and_sink_with_distinct_stacks_both_emitted() {
    let store = FactStore::open_in_memory().unwrap();

    insert(&store, TableId::Files, vec![file_row("app.py")]);
    insert(&store, TableId::Symbols, vec![
        function_row("app.py", "main", 1, 10, &[]),
        function_row("app.py", "via_a", 20, 23, &["v"]),
        function_row("app.py", "via_b", 30, 33, &["v"]),
        function_row("app.py", "sink_fn", 40, 43, &["data"]),
    ]);
    insert(&store, TableId::Assignments, vec![
        assignment("app.py", 2, "main", "x", "request.args.get('q')", &["request"]),
    ]);
    insert(&store, TableId::Calls, vec![
        call("app.py", 3, "main", "via_a", ""),
        call("app.py", 4, "main", "via_b", ""),
        call("app.py", 21, "via_a", "sink_fn", ""),
        call("app.py", 31, "via_b", "sink_fn", ""),
        call("app.py", 41, "sink_fn", "execute", "cursor"),
    ]);
    insert(&store, TableId::CallArgs, vec![
        arg("app.py", 3, "via_a", "x", &["x"]),
        arg("app.py", 4, "via_b", "x", &["x"]),
        arg("app.py", 21, "sink_fn", "v", &["v"]),
        arg("app.py", 31, "sink_fn", "v", &["v"]),
        arg("app.py", 41, "execute", "data", &["data"]),
    ]);

    let report = run_engine(&store);

    assert_eq!(report.paths.len(), 2, "distinct stacks are distinct findings");
    assert_eq!(report.paths[0].source.line, report.paths[1].source.line);
    assert_eq!(report.paths[0].sink.line, report.paths[1].sink.line);
    assert_ne!(report.paths[0].call_stack, report.paths[1].call_stack);
}

/// Self-recursive argument flow terminates under the depth bound and
/// the per-signature recursion counter.
#[test]
fn recursion_terminates() {
    let store = FactStore::open_in_memory().unwrap();

    insert(&store, TableId::Files, vec![file_row("rec.py")]);
    insert(&store, TableId::Symbols, vec![
        function_row("rec.py", "recurse", 1, 10, &["v"]),
    ]);
    insert(&store, TableId::Assignments, vec![
        assignment("rec.py", 2, "recurse", "x", "request.args.get('q')", &["request"]),
    ]);
    insert(&store, TableId::Calls, vec![
        call("rec.py", 3, "recurse", "recurse", ""),
        call("rec.py", 8, "recurse", "execute", "cursor"),
    ]);
    insert(&store, TableId::CallArgs, vec![
        arg("rec.py", 3, "recurse", "x", &["x"]),
        arg("rec.py", 8, "execute", "x", &["x"]),
    ]);

    let report = run_engine(&store);
    assert!(!report.paths.is_empty(), "sink inside the recursive fn is found");
    for path in &report.paths {
        // max_depth + 1 signature frames plus the sink frame.
        assert!(path.call_stack.len() <= 14, "depth bound holds");
    }
}

/// A dynamic callee halts propagation but the hop is preserved as
/// evidence with `requires_runtime_analysis`.
#[test]
fn dynamic_callee_halts_and_is_preserved() {
    let store = FactStore::open_in_memory().unwrap();

    insert(&store, TableId::Files, vec![file_row("dyn.py")]);
    insert(&store, TableId::Symbols, vec![
        function_row("dyn.py", "handler", 1, 6, &[]),
    ]);
    insert(&store, TableId::Assignments, vec![
        assignment("dyn.py", 2, "handler", "x", "request.args.get('q')", &["request"]),
    ]);
    insert(&store, TableId::Calls, vec![
        dynamic_call("dyn.py", 4, "handler", "getattr(mod, name)"),
    ]);
    insert(&store, TableId::CallArgs, vec![
        arg("dyn.py", 4, "getattr(mod, name)", "x", &["x"]),
    ]);

    let report = run_engine(&store);
    assert_eq!(report.paths.len(), 1);
    let path = &report.paths[0];
    assert!(path.requires_runtime_analysis);
    assert_eq!(path.sink.kind, "dynamic_call");
}

/// Return flow: taint travels back to the caller's binding.
#[test]
fn return_flow_reaches_caller_sink() {
    let store = FactStore::open_in_memory().unwrap();

    insert(&store, TableId::Files, vec![file_row("ret.py")]);
    insert(&store, TableId::Symbols, vec![
        function_row("ret.py", "read_input", 1, 4, &[]),
        function_row("ret.py", "main", 10, 15, &[]),
    ]);
    insert(&store, TableId::Assignments, vec![
        assignment("ret.py", 2, "read_input", "raw", "request.args.get('q')", &["request"]),
        assignment("ret.py", 11, "main", "data", "read_input()", &[]),
    ]);
    insert(&store, TableId::Returns, vec![FactRow::Return(ReturnRow {
        file: "ret.py".to_string(),
        line: 3,
        in_function: "read_input".to_string(),
        read_vars: "[\"raw\"]".to_string(),
    })]);
    insert(&store, TableId::Calls, vec![
        call("ret.py", 11, "main", "read_input", ""),
        call("ret.py", 12, "main", "execute", "cursor"),
    ]);
    insert(&store, TableId::CallArgs, vec![
        arg("ret.py", 12, "execute", "data", &["data"]),
    ]);

    let report = run_engine(&store);
    assert_eq!(report.paths.len(), 1);
    let path = &report.paths[0];
    assert_eq!(path.sink.function, "main");
    // The return hop appended a frame for the caller.
    assert!(path.call_stack.iter().any(|f| f.function == "main"));
}

/// Functions without CFG rows are reported as fallbacks.
#[test]
fn missing_cfg_falls_back_and_is_reported() {
    let store = FactStore::open_in_memory().unwrap();

    insert(&store, TableId::Files, vec![file_row("nocfg.py")]);
    insert(&store, TableId::Symbols, vec![
        function_row("nocfg.py", "handler", 1, 6, &[]),
    ]);
    insert(&store, TableId::Assignments, vec![
        assignment("nocfg.py", 2, "handler", "x", "request.args.get('q')", &["request"]),
    ]);
    insert(&store, TableId::Calls, vec![
        call("nocfg.py", 4, "handler", "execute", "cursor"),
    ]);
    insert(&store, TableId::CallArgs, vec![
        arg("nocfg.py", 4, "execute", "x", &["x"]),
    ]);

    let report = run_engine(&store);
    assert_eq!(report.paths.len(), 1);
    assert!(report
        .cfg_fallbacks
        .iter()
        .any(|f| f.contains("handler")));
}
