//! Typed rows for every fact table.
//!
//! Extractors construct these with `file` left empty — the canonical path
//! is injected by the normalizer, and a pre-populated `file` is a contract
//! violation. `line` always refers to the construct's starting line.
//!
//! Primary keys are composite and include at least `(file, line, …)` so a
//! construct may occur more than once per site; `primary_key()` is the
//! projection used for pre-flush deduplication.

use serde::{Deserialize, Serialize};

use super::tables::TableId;

/// A source file at its canonical project-relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRow {
    pub path: String,
    pub language: String,
    pub content_hash: i64,
    pub file_size: i64,
    /// Comma-joined advisory framework tags ("" when none).
    pub framework_tags: String,
    /// "ok" or "parse_failed".
    pub parse_status: String,
    pub parse_error: String,
}

/// A named declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRow {
    pub file: String,
    pub line: u32,
    pub end_line: u32,
    /// "function", "class", "method", "field".
    pub kind: String,
    pub name: String,
    pub qualified_name: String,
    /// Innermost enclosing function, or "global".
    pub scope: String,
    /// JSON array of parameter names (functions and methods; "[]" otherwise).
    pub params: String,
    /// Stable id, assigned by the normalizer (0 until then).
    pub symbol_id: i64,
}

/// A use-site of a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefRow {
    pub file: String,
    pub line: u32,
    pub name: String,
    /// "import", "from", "call", "read", "write".
    pub kind: String,
    /// "resolved", "unresolved", or "external"; set by the normalizer.
    pub resolution: String,
    /// Target symbol id when resolved (0 otherwise).
    pub target_symbol_id: i64,
}

/// A call expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRow {
    pub file: String,
    pub line: u32,
    /// Innermost enclosing function, or "global".
    pub caller_function: String,
    pub callee_name: String,
    /// Receiver expression for method calls ("" for plain calls).
    pub receiver: String,
    pub argument_count: u32,
    /// Dynamic dispatch or reflection: the callee could not be named.
    pub callee_unresolved: bool,
    pub requires_runtime_analysis: bool,
}

/// One positional or keyword argument of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallArgRow {
    pub file: String,
    pub line: u32,
    pub callee_name: String,
    pub arg_index: u32,
    /// Keyword name ("" for positional).
    pub keyword: String,
    pub expression: String,
    /// JSON array of variable names read by the expression.
    pub read_vars: String,
}

/// A binding of an expression to an lvalue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    pub target: String,
    pub expression: String,
    /// JSON array of variable names read on the rhs.
    pub read_vars: String,
}

/// A return statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    /// JSON array of variable names contributing to the value.
    pub read_vars: String,
}

/// A basic block of a function's control-flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgBlockRow {
    pub file: String,
    pub function: String,
    pub block_index: u32,
    /// "entry", "body", "branch", "loop", "exit".
    pub kind: String,
    pub line: u32,
    pub end_line: u32,
}

/// A directed edge between basic blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgEdgeRow {
    pub file: String,
    pub function: String,
    pub from_block: u32,
    pub to_block: u32,
    /// "fallthrough", "true", "false", "loop_back", "exception".
    pub kind: String,
    pub line: u32,
}

/// A request-handler binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRow {
    pub file: String,
    pub line: u32,
    pub method: String,
    pub pattern: String,
    pub handler: String,
    /// "http" or "form_action" — cross-boundary matchers filter by kind.
    pub endpoint_kind: String,
    pub has_group_segments: bool,
    pub has_optional_params: bool,
    pub has_rest_params: bool,
}

/// One parameter of a route pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointParamRow {
    pub file: String,
    pub line: u32,
    pub pattern: String,
    pub name: String,
    /// Index of the path segment the parameter occupies (group segments
    /// do not count).
    pub segment: u32,
    pub is_optional: bool,
    pub is_rest: bool,
    /// Matcher name ("" when unconstrained).
    pub matcher: String,
}

/// An ORM model declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrmModelRow {
    pub file: String,
    pub line: u32,
    pub name: String,
    pub table_name: String,
    pub framework: String,
}

/// One column/field of an ORM model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrmFieldRow {
    pub file: String,
    pub line: u32,
    pub model: String,
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// An association between ORM models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrmAssociationRow {
    pub file: String,
    pub line: u32,
    pub model: String,
    /// "relationship", "foreign_key", "backref".
    pub kind: String,
    pub target: String,
}

/// A background job / task declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRow {
    pub file: String,
    pub line: u32,
    pub name: String,
    pub queue: String,
    pub framework: String,
}

/// A periodic schedule entry for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobScheduleRow {
    pub file: String,
    pub line: u32,
    pub job_name: String,
    pub schedule: String,
    pub framework: String,
}

/// A dependency-injection site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiInjectionRow {
    pub file: String,
    pub line: u32,
    pub target: String,
    pub dependency: String,
    pub framework: String,
}

/// A validator schema declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSchemaRow {
    pub file: String,
    pub line: u32,
    pub name: String,
    pub framework: String,
    pub field_count: u32,
}

/// A form declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRow {
    pub file: String,
    pub line: u32,
    pub name: String,
    pub framework: String,
    pub field_count: u32,
}

/// A test fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRow {
    pub file: String,
    pub line: u32,
    pub name: String,
    pub scope: String,
    pub autouse: bool,
}

/// A test parametrization decorator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametrizationRow {
    pub file: String,
    pub line: u32,
    pub test_name: String,
    pub param_names: String,
    pub case_count: u32,
}

/// A test marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerRow {
    pub file: String,
    pub line: u32,
    pub test_name: String,
    pub marker: String,
}

/// An instance-state mutation site.
///
/// At most one of the three context flags may be true; mutations in
/// regular methods carry all three false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMutationRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    pub target: String,
    /// "assignment", "augmented_assignment", "method_call".
    pub operation: String,
    pub is_init: bool,
    pub is_property_setter: bool,
    pub is_dunder_method: bool,
}

/// An I/O operation.
///
/// `target` is recorded only for literal arguments; dynamic targets set
/// `is_static=false` and leave `target` empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoOperationRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    /// "file_read", "file_write", "network", "process", "env_read".
    pub kind: String,
    pub target: Option<String>,
    pub is_static: bool,
    pub mode: String,
    pub requires_runtime_analysis: bool,
}

/// An exception raise or catch site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionFlowRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    /// "raise" or "catch".
    pub kind: String,
    pub exception_type: String,
}

/// A property getter/setter/deleter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAccessorRow {
    pub file: String,
    pub line: u32,
    pub class_name: String,
    pub name: String,
    /// "getter", "setter", "deleter".
    pub kind: String,
}

/// A generator yield site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorYieldRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    pub expression: String,
    /// `yield from` / delegated yield.
    pub is_delegated: bool,
}

/// A loop-complexity indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopMetricRow {
    pub file: String,
    pub line: u32,
    pub in_function: String,
    /// "for", "while".
    pub kind: String,
    /// Nesting depth, 1 for top-level loops.
    pub depth: u32,
    pub has_early_exit: bool,
}

/// A per-package-manager manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepManifestRow {
    pub file: String,
    pub line: u32,
    /// "pip", "npm", "cargo", "docker".
    pub package_manager: String,
    pub name: String,
    pub version: String,
    pub build_system: String,
}

/// One dependency entry of a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepEntryRow {
    pub file: String,
    pub line: u32,
    pub package_manager: String,
    pub name: String,
    pub spec: String,
    /// Optional-group name ("" for the main group).
    pub group_name: String,
    pub is_optional: bool,
}

/// A persisted taint path (analyzer output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintFlowRow {
    pub file: String,
    pub line: u32,
    pub source_expression: String,
    pub sink_file: String,
    pub sink_line: u32,
    pub sink_expression: String,
    pub sink_kind: String,
    /// JSON array of `(file, function, line)` frames.
    pub call_stack: String,
    pub depth: u32,
    pub requires_runtime_analysis: bool,
}

/// A generic analyzer finding (analyzer output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingRow {
    pub file: String,
    pub line: u32,
    pub rule_id: String,
    pub severity: String,
    pub message: String,
    pub evidence: String,
    pub analyzer: String,
}

/// A row destined for one registered fact table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FactRow {
    File(FileRow),
    Symbol(SymbolRow),
    Ref(RefRow),
    Call(CallRow),
    CallArg(CallArgRow),
    Assignment(AssignmentRow),
    Return(ReturnRow),
    CfgBlock(CfgBlockRow),
    CfgEdge(CfgEdgeRow),
    Endpoint(EndpointRow),
    EndpointParam(EndpointParamRow),
    OrmModel(OrmModelRow),
    OrmField(OrmFieldRow),
    OrmAssociation(OrmAssociationRow),
    Job(JobRow),
    JobSchedule(JobScheduleRow),
    DiInjection(DiInjectionRow),
    ValidationSchema(ValidationSchemaRow),
    Form(FormRow),
    Fixture(FixtureRow),
    Parametrization(ParametrizationRow),
    Marker(MarkerRow),
    StateMutation(StateMutationRow),
    IoOperation(IoOperationRow),
    ExceptionFlow(ExceptionFlowRow),
    PropertyAccessor(PropertyAccessorRow),
    GeneratorYield(GeneratorYieldRow),
    LoopMetric(LoopMetricRow),
    DepManifest(DepManifestRow),
    DepEntry(DepEntryRow),
    TaintFlow(TaintFlowRow),
    Finding(FindingRow),
}

impl FactRow {
    /// The table this row belongs to.
    pub fn table(&self) -> TableId {
        match self {
            Self::File(_) => TableId::Files,
            Self::Symbol(_) => TableId::Symbols,
            Self::Ref(_) => TableId::Refs,
            Self::Call(_) => TableId::Calls,
            Self::CallArg(_) => TableId::CallArgs,
            Self::Assignment(_) => TableId::Assignments,
            Self::Return(_) => TableId::Returns,
            Self::CfgBlock(_) => TableId::CfgBlocks,
            Self::CfgEdge(_) => TableId::CfgEdges,
            Self::Endpoint(_) => TableId::Endpoints,
            Self::EndpointParam(_) => TableId::EndpointParams,
            Self::OrmModel(_) => TableId::OrmModels,
            Self::OrmField(_) => TableId::OrmFields,
            Self::OrmAssociation(_) => TableId::OrmAssociations,
            Self::Job(_) => TableId::Jobs,
            Self::JobSchedule(_) => TableId::JobSchedules,
            Self::DiInjection(_) => TableId::DiInjections,
            Self::ValidationSchema(_) => TableId::ValidationSchemas,
            Self::Form(_) => TableId::Forms,
            Self::Fixture(_) => TableId::Fixtures,
            Self::Parametrization(_) => TableId::Parametrizations,
            Self::Marker(_) => TableId::Markers,
            Self::StateMutation(_) => TableId::StateMutations,
            Self::IoOperation(_) => TableId::IoOperations,
            Self::ExceptionFlow(_) => TableId::ExceptionFlows,
            Self::PropertyAccessor(_) => TableId::PropertyAccessors,
            Self::GeneratorYield(_) => TableId::GeneratorYields,
            Self::LoopMetric(_) => TableId::LoopMetrics,
            Self::DepManifest(_) => TableId::DepManifests,
            Self::DepEntry(_) => TableId::DepEntries,
            Self::TaintFlow(_) => TableId::TaintFlows,
            Self::Finding(_) => TableId::Findings,
        }
    }

    /// The canonical `file` column ("" until the normalizer injects it).
    ///
    /// For `Files` rows the path field is the identity itself.
    pub fn file(&self) -> &str {
        match self {
            Self::File(r) => &r.path,
            Self::Symbol(r) => &r.file,
            Self::Ref(r) => &r.file,
            Self::Call(r) => &r.file,
            Self::CallArg(r) => &r.file,
            Self::Assignment(r) => &r.file,
            Self::Return(r) => &r.file,
            Self::CfgBlock(r) => &r.file,
            Self::CfgEdge(r) => &r.file,
            Self::Endpoint(r) => &r.file,
            Self::EndpointParam(r) => &r.file,
            Self::OrmModel(r) => &r.file,
            Self::OrmField(r) => &r.file,
            Self::OrmAssociation(r) => &r.file,
            Self::Job(r) => &r.file,
            Self::JobSchedule(r) => &r.file,
            Self::DiInjection(r) => &r.file,
            Self::ValidationSchema(r) => &r.file,
            Self::Form(r) => &r.file,
            Self::Fixture(r) => &r.file,
            Self::Parametrization(r) => &r.file,
            Self::Marker(r) => &r.file,
            Self::StateMutation(r) => &r.file,
            Self::IoOperation(r) => &r.file,
            Self::ExceptionFlow(r) => &r.file,
            Self::PropertyAccessor(r) => &r.file,
            Self::GeneratorYield(r) => &r.file,
            Self::LoopMetric(r) => &r.file,
            Self::DepManifest(r) => &r.file,
            Self::DepEntry(r) => &r.file,
            Self::TaintFlow(r) => &r.file,
            Self::Finding(r) => &r.file,
        }
    }

    /// Inject the canonical file path. Only the normalizer calls this.
    pub fn set_file(&mut self, path: &str) {
        match self {
            Self::File(r) => r.path = path.to_string(),
            Self::Symbol(r) => r.file = path.to_string(),
            Self::Ref(r) => r.file = path.to_string(),
            Self::Call(r) => r.file = path.to_string(),
            Self::CallArg(r) => r.file = path.to_string(),
            Self::Assignment(r) => r.file = path.to_string(),
            Self::Return(r) => r.file = path.to_string(),
            Self::CfgBlock(r) => r.file = path.to_string(),
            Self::CfgEdge(r) => r.file = path.to_string(),
            Self::Endpoint(r) => r.file = path.to_string(),
            Self::EndpointParam(r) => r.file = path.to_string(),
            Self::OrmModel(r) => r.file = path.to_string(),
            Self::OrmField(r) => r.file = path.to_string(),
            Self::OrmAssociation(r) => r.file = path.to_string(),
            Self::Job(r) => r.file = path.to_string(),
            Self::JobSchedule(r) => r.file = path.to_string(),
            Self::DiInjection(r) => r.file = path.to_string(),
            Self::ValidationSchema(r) => r.file = path.to_string(),
            Self::Form(r) => r.file = path.to_string(),
            Self::Fixture(r) => r.file = path.to_string(),
            Self::Parametrization(r) => r.file = path.to_string(),
            Self::Marker(r) => r.file = path.to_string(),
            Self::StateMutation(r) => r.file = path.to_string(),
            Self::IoOperation(r) => r.file = path.to_string(),
            Self::ExceptionFlow(r) => r.file = path.to_string(),
            Self::PropertyAccessor(r) => r.file = path.to_string(),
            Self::GeneratorYield(r) => r.file = path.to_string(),
            Self::LoopMetric(r) => r.file = path.to_string(),
            Self::DepManifest(r) => r.file = path.to_string(),
            Self::DepEntry(r) => r.file = path.to_string(),
            Self::TaintFlow(r) => r.file = path.to_string(),
            Self::Finding(r) => r.file = path.to_string(),
        }
    }

    /// Primary-key projection used for pre-flush deduplication.
    ///
    /// The projection concatenates the key columns with `\x1f`; it is the
    /// in-memory mirror of the composite PRIMARY KEY declared in the
    /// physical schema.
    pub fn primary_key(&self) -> String {
        fn join(parts: &[&str]) -> String {
            parts.join("\u{1f}")
        }
        match self {
            Self::File(r) => r.path.clone(),
            Self::Symbol(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.kind,
                &r.qualified_name,
            ]),
            Self::Ref(r) => join(&[&r.file, &r.line.to_string(), &r.name, &r.kind]),
            Self::Call(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.callee_name,
                &r.caller_function,
            ]),
            Self::CallArg(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.callee_name,
                &r.arg_index.to_string(),
            ]),
            Self::Assignment(r) => join(&[&r.file, &r.line.to_string(), &r.target]),
            Self::Return(r) => join(&[&r.file, &r.line.to_string(), &r.in_function]),
            Self::CfgBlock(r) => join(&[&r.file, &r.function, &r.block_index.to_string()]),
            Self::CfgEdge(r) => join(&[
                &r.file,
                &r.function,
                &r.from_block.to_string(),
                &r.to_block.to_string(),
            ]),
            Self::Endpoint(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.method,
                &r.pattern,
                &r.endpoint_kind,
            ]),
            Self::EndpointParam(r) => join(&[&r.file, &r.pattern, &r.name]),
            Self::OrmModel(r) => join(&[&r.file, &r.line.to_string(), &r.name]),
            Self::OrmField(r) => join(&[&r.file, &r.line.to_string(), &r.model, &r.name]),
            Self::OrmAssociation(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.model,
                &r.kind,
                &r.target,
            ]),
            Self::Job(r) => join(&[&r.file, &r.line.to_string(), &r.name]),
            Self::JobSchedule(r) => join(&[&r.file, &r.line.to_string(), &r.job_name]),
            Self::DiInjection(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.target,
                &r.dependency,
            ]),
            Self::ValidationSchema(r) => join(&[&r.file, &r.line.to_string(), &r.name]),
            Self::Form(r) => join(&[&r.file, &r.line.to_string(), &r.name]),
            Self::Fixture(r) => join(&[&r.file, &r.line.to_string(), &r.name]),
            Self::Parametrization(r) => join(&[&r.file, &r.line.to_string(), &r.test_name]),
            Self::Marker(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.test_name,
                &r.marker,
            ]),
            Self::StateMutation(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.target,
                &r.operation,
            ]),
            Self::IoOperation(r) => join(&[&r.file, &r.line.to_string(), &r.kind]),
            Self::ExceptionFlow(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.kind,
                &r.exception_type,
            ]),
            Self::PropertyAccessor(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.class_name,
                &r.name,
                &r.kind,
            ]),
            Self::GeneratorYield(r) => join(&[&r.file, &r.line.to_string()]),
            Self::LoopMetric(r) => join(&[&r.file, &r.line.to_string()]),
            Self::DepManifest(r) => join(&[&r.file, &r.package_manager]),
            Self::DepEntry(r) => join(&[&r.file, &r.name, &r.group_name]),
            Self::TaintFlow(r) => join(&[
                &r.file,
                &r.line.to_string(),
                &r.sink_file,
                &r.sink_line.to_string(),
                &r.call_stack,
            ]),
            Self::Finding(r) => join(&[&r.rule_id, &r.file, &r.line.to_string(), &r.analyzer]),
        }
    }
}
