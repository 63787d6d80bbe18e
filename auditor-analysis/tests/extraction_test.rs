//! Extractor tests over literal sources.

use std::path::PathBuf;

use auditor_analysis::extract::{self, FileInfo};
use auditor_analysis::parsers::ParserManager;
use auditor_analysis::scanner::Language;
use auditor_core::facts::rows::FactRow;
use auditor_core::facts::staging::FileFacts;
use auditor_core::facts::tables::TableId;

fn info(relative: &str, language: Language) -> FileInfo {
    FileInfo {
        path: PathBuf::from(format!("/project/{relative}")),
        relative_path: relative.to_string(),
        language,
        framework_tags: Vec::new(),
    }
}

fn extract_source(relative: &str, language: Language, source: &str) -> FileFacts {
    let parsers = ParserManager::new();
    let tree = parsers.parse(source.as_bytes(), relative, language).unwrap();
    extract::extract_file(&info(relative, language), source.as_bytes(), Some(&tree)).unwrap()
}

/// `__init__` assignments and regular-method augmented assignments are
/// distinguished by the context flags.
#[test]
fn state_mutations_distinguish_init_from_side_effects() {
    let source = "\
class Counter:
    def __init__(self):
        self.count = 0

    def increment(self):
        self.count += 1
";
    let facts = extract_source("counter.py", Language::Python, source);

    let mutations: Vec<_> = facts
        .rows(TableId::StateMutations)
        .iter()
        .filter_map(|r| match r {
            FactRow::StateMutation(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(mutations.len(), 2);

    let init = mutations.iter().find(|m| m.is_init).expect("init mutation");
    assert_eq!(init.target, "self.count");
    assert_eq!(init.operation, "assignment");

    let increment = mutations.iter().find(|m| !m.is_init).expect("increment mutation");
    assert_eq!(increment.target, "self.count");
    assert_eq!(increment.operation, "augmented_assignment");
    assert!(!increment.is_property_setter);
    assert!(!increment.is_dunder_method);

    // At most one context flag per row.
    for m in &mutations {
        let flags = [m.is_init, m.is_property_setter, m.is_dunder_method];
        assert!(flags.iter().filter(|f| **f).count() <= 1);
    }
}

#[test]
fn python_symbols_and_params() {
    let source = "\
def handler(req, limit=10):
    return req

class Service:
    def run(self, job):
        pass
";
    let facts = extract_source("svc.py", Language::Python, source);

    let symbols: Vec<_> = facts
        .rows(TableId::Symbols)
        .iter()
        .filter_map(|r| match r {
            FactRow::Symbol(s) => Some(s),
            _ => None,
        })
        .collect();

    let handler = symbols.iter().find(|s| s.name == "handler").unwrap();
    assert_eq!(handler.kind, "function");
    assert_eq!(handler.params, r#"["req","limit"]"#);

    let run = symbols.iter().find(|s| s.name == "run").unwrap();
    assert_eq!(run.kind, "method");
    assert_eq!(run.qualified_name, "Service.run");
}

/// Static literal I/O targets are recorded; computed targets are not.
#[test]
fn io_targets_static_vs_dynamic() {
    let source = "\
def load(path):
    fixed = open('config.json')
    data = open(path)
    return fixed, data
";
    let facts = extract_source("io.py", Language::Python, source);

    let ops: Vec<_> = facts
        .rows(TableId::IoOperations)
        .iter()
        .filter_map(|r| match r {
            FactRow::IoOperation(op) => Some(op),
            _ => None,
        })
        .collect();
    assert_eq!(ops.len(), 2);

    let fixed = ops.iter().find(|o| o.line == 2).unwrap();
    assert_eq!(fixed.target.as_deref(), Some("config.json"));
    assert!(fixed.is_static);
    assert!(!fixed.requires_runtime_analysis);

    let dynamic = ops.iter().find(|o| o.line == 3).unwrap();
    assert_eq!(dynamic.target, None);
    assert!(!dynamic.is_static);
    assert!(dynamic.requires_runtime_analysis);
}

#[test]
fn python_dataflow_rows() {
    let source = "\
def handler(request):
    q = request.args.get('q')
    result = transform(q)
    return result
";
    let facts = extract_source("flow.py", Language::Python, source);

    let assigns: Vec<_> = facts
        .rows(TableId::Assignments)
        .iter()
        .filter_map(|r| match r {
            FactRow::Assignment(a) => Some(a),
            _ => None,
        })
        .collect();
    let q = assigns.iter().find(|a| a.target == "q").unwrap();
    assert_eq!(q.in_function, "handler");
    assert!(q.read_vars.contains("request"));

    let calls: Vec<_> = facts
        .rows(TableId::Calls)
        .iter()
        .filter_map(|r| match r {
            FactRow::Call(c) => Some(c),
            _ => None,
        })
        .collect();
    let transform = calls.iter().find(|c| c.callee_name == "transform").unwrap();
    assert_eq!(transform.caller_function, "handler");

    let args: Vec<_> = facts
        .rows(TableId::CallArgs)
        .iter()
        .filter_map(|r| match r {
            FactRow::CallArg(a) => Some(a),
            _ => None,
        })
        .collect();
    assert!(args
        .iter()
        .any(|a| a.callee_name == "transform" && a.read_vars.contains('q')));

    let returns = facts.rows(TableId::Returns);
    assert_eq!(returns.len(), 1);
}

#[test]
fn rows_never_carry_a_file_column() {
    let source = "def f():\n    x = 1\n    return x\n";
    let facts = extract_source("nofile.py", Language::Python, source);
    for table in auditor_core::facts::tables::TableId::ALL {
        for row in facts.rows(*table) {
            assert!(row.file().is_empty(), "{} row carried a file", table.name());
        }
    }
}

#[test]
fn sqlalchemy_models_gated_and_extracted() {
    let source = "\
from sqlalchemy import Column, Integer, String, ForeignKey
from sqlalchemy.orm import relationship

class User(Base):
    __tablename__ = 'users'
    id = Column(Integer, primary_key=True)
    email = Column(String, nullable=True)
    posts = relationship('Post', backref='author')
";
    let facts = extract_source("models.py", Language::Python, source);

    let models = facts.rows(TableId::OrmModels);
    assert_eq!(models.len(), 1);
    if let FactRow::OrmModel(m) = &models[0] {
        assert_eq!(m.name, "User");
        assert_eq!(m.table_name, "users");
    }

    let fields: Vec<_> = facts
        .rows(TableId::OrmFields)
        .iter()
        .filter_map(|r| match r {
            FactRow::OrmField(f) => Some(f),
            _ => None,
        })
        .collect();
    assert!(fields.iter().any(|f| f.name == "id" && f.primary_key));
    assert!(fields.iter().any(|f| f.name == "email" && f.nullable));

    let associations = facts.rows(TableId::OrmAssociations);
    assert!(associations.len() >= 2, "relationship + backref");
}

#[test]
fn framework_pass_produces_nothing_without_signal() {
    let source = "def plain():\n    return 1\n";
    let facts = extract_source("plain.py", Language::Python, source);
    assert!(facts.rows(TableId::OrmModels).is_empty());
    assert!(facts.rows(TableId::Jobs).is_empty());
    assert!(facts.rows(TableId::Fixtures).is_empty());
}

#[test]
fn pytest_fixture_and_parametrize() {
    let source = "\
import pytest

@pytest.fixture(scope='session', autouse=True)
def db():
    yield connect()

@pytest.mark.parametrize('a,b', [(1, 2), (3, 4), (5, 6)])
def test_add(a, b):
    assert a < b

@pytest.mark.slow
def test_heavy():
    pass
";
    let facts = extract_source("test_math.py", Language::Python, source);

    let fixtures: Vec<_> = facts
        .rows(TableId::Fixtures)
        .iter()
        .filter_map(|r| match r {
            FactRow::Fixture(f) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(fixtures.len(), 1);
    assert_eq!(fixtures[0].scope, "session");
    assert!(fixtures[0].autouse);

    let params: Vec<_> = facts
        .rows(TableId::Parametrizations)
        .iter()
        .filter_map(|r| match r {
            FactRow::Parametrization(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].param_names, "a,b");
    assert_eq!(params[0].case_count, 3);

    let markers: Vec<_> = facts
        .rows(TableId::Markers)
        .iter()
        .filter_map(|r| match r {
            FactRow::Marker(m) => Some(m),
            _ => None,
        })
        .collect();
    assert!(markers.iter().any(|m| m.marker == "slow" && m.test_name == "test_heavy"));
}

#[test]
fn exception_flows_extracted() {
    let source = "\
def guard(x):
    try:
        risky()
    except (ValueError, KeyError):
        raise RuntimeError('bad')
";
    let facts = extract_source("exc.py", Language::Python, source);

    let flows: Vec<_> = facts
        .rows(TableId::ExceptionFlows)
        .iter()
        .filter_map(|r| match r {
            FactRow::ExceptionFlow(e) => Some(e),
            _ => None,
        })
        .collect();
    assert!(flows.iter().any(|f| f.kind == "catch" && f.exception_type.contains("ValueError")));
    assert!(flows.iter().any(|f| f.kind == "raise" && f.exception_type == "RuntimeError"));
}

#[test]
fn cfg_blocks_emitted_per_function() {
    let source = "\
def branchy(flag):
    x = 1
    if flag:
        x = 2
    else:
        x = 3
    return x
";
    let facts = extract_source("cfg.py", Language::Python, source);

    let blocks = facts.rows(TableId::CfgBlocks);
    let edges = facts.rows(TableId::CfgEdges);
    assert!(blocks.len() >= 4, "entry, body, branch, exit at minimum");
    assert!(!edges.is_empty());

    let kinds: Vec<String> = blocks
        .iter()
        .filter_map(|r| match r {
            FactRow::CfgBlock(b) => Some(b.kind.clone()),
            _ => None,
        })
        .collect();
    assert!(kinds.contains(&"entry".to_string()));
    assert!(kinds.contains(&"branch".to_string()));
    assert!(kinds.contains(&"exit".to_string()));
}

#[test]
fn javascript_symbols_and_calls() {
    let source = "\
import { helper } from './util';

export function handler(req, res) {
    const q = req.query.name;
    const out = helper(q);
    res.send(out);
}
";
    let facts = extract_source("app.js", Language::JavaScript, source);

    let symbols: Vec<_> = facts
        .rows(TableId::Symbols)
        .iter()
        .filter_map(|r| match r {
            FactRow::Symbol(s) => Some(s),
            _ => None,
        })
        .collect();
    assert!(symbols.iter().any(|s| s.name == "handler" && s.kind == "function"));

    let calls: Vec<_> = facts
        .rows(TableId::Calls)
        .iter()
        .filter_map(|r| match r {
            FactRow::Call(c) => Some(c),
            _ => None,
        })
        .collect();
    assert!(calls.iter().any(|c| c.callee_name == "helper" && c.caller_function == "handler"));
    assert!(calls.iter().any(|c| c.callee_name == "send" && c.receiver == "res"));
}
