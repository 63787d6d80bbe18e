//! The central table registry.
//!
//! `TABLE_COUNT` is asserted against the physical store at startup.
//! Contributors adding a table must add the `TableId` variant, extend
//! `ALL` and `FLUSH_ORDER`, declare the schema in `auditor-storage`,
//! and bump `TABLE_COUNT` — the engine refuses to run otherwise.

use serde::{Deserialize, Serialize};

/// Declared total of fact tables. Checked against `TableId::ALL` and the
/// physical store at initialization.
pub const TABLE_COUNT: usize = 32;

/// Identifier for every fact table a frontend may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableId {
    Files,
    Symbols,
    Refs,
    Calls,
    CallArgs,
    Assignments,
    Returns,
    CfgBlocks,
    CfgEdges,
    Endpoints,
    EndpointParams,
    OrmModels,
    OrmFields,
    OrmAssociations,
    Jobs,
    JobSchedules,
    DiInjections,
    ValidationSchemas,
    Forms,
    Fixtures,
    Parametrizations,
    Markers,
    StateMutations,
    IoOperations,
    ExceptionFlows,
    PropertyAccessors,
    GeneratorYields,
    LoopMetrics,
    DepManifests,
    DepEntries,
    TaintFlows,
    Findings,
}

impl TableId {
    /// All registered tables. `ALL.len()` must equal `TABLE_COUNT`.
    pub const ALL: &'static [TableId] = &[
        Self::Files,
        Self::Symbols,
        Self::Refs,
        Self::Calls,
        Self::CallArgs,
        Self::Assignments,
        Self::Returns,
        Self::CfgBlocks,
        Self::CfgEdges,
        Self::Endpoints,
        Self::EndpointParams,
        Self::OrmModels,
        Self::OrmFields,
        Self::OrmAssociations,
        Self::Jobs,
        Self::JobSchedules,
        Self::DiInjections,
        Self::ValidationSchemas,
        Self::Forms,
        Self::Fixtures,
        Self::Parametrizations,
        Self::Markers,
        Self::StateMutations,
        Self::IoOperations,
        Self::ExceptionFlows,
        Self::PropertyAccessors,
        Self::GeneratorYields,
        Self::LoopMetrics,
        Self::DepManifests,
        Self::DepEntries,
        Self::TaintFlows,
        Self::Findings,
    ];

    /// Declared flush order: referenced-entity tables precede referrers.
    /// The batch writer commits tables in exactly this sequence.
    pub const FLUSH_ORDER: &'static [TableId] = Self::ALL;

    /// Physical table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Symbols => "symbols",
            Self::Refs => "refs",
            Self::Calls => "calls",
            Self::CallArgs => "call_args",
            Self::Assignments => "assignments",
            Self::Returns => "returns",
            Self::CfgBlocks => "cfg_blocks",
            Self::CfgEdges => "cfg_edges",
            Self::Endpoints => "endpoints",
            Self::EndpointParams => "endpoint_params",
            Self::OrmModels => "orm_models",
            Self::OrmFields => "orm_fields",
            Self::OrmAssociations => "orm_associations",
            Self::Jobs => "jobs",
            Self::JobSchedules => "job_schedules",
            Self::DiInjections => "di_injections",
            Self::ValidationSchemas => "validation_schemas",
            Self::Forms => "forms",
            Self::Fixtures => "fixtures",
            Self::Parametrizations => "parametrizations",
            Self::Markers => "markers",
            Self::StateMutations => "state_mutations",
            Self::IoOperations => "io_operations",
            Self::ExceptionFlows => "exception_flows",
            Self::PropertyAccessors => "property_accessors",
            Self::GeneratorYields => "generator_yields",
            Self::LoopMetrics => "loop_metrics",
            Self::DepManifests => "dep_manifests",
            Self::DepEntries => "dep_entries",
            Self::TaintFlows => "taint_flows",
            Self::Findings => "findings",
        }
    }

    /// Parse a physical table name back into an id.
    pub fn parse_name(name: &str) -> Option<TableId> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_count_matches_registry() {
        assert_eq!(TableId::ALL.len(), TABLE_COUNT);
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = TableId::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TABLE_COUNT);
    }

    #[test]
    fn flush_order_covers_every_table_once() {
        let mut order = TableId::FLUSH_ORDER.to_vec();
        order.sort_unstable();
        order.dedup();
        assert_eq!(order.len(), TABLE_COUNT);
    }

    #[test]
    fn parse_name_round_trips() {
        for t in TableId::ALL {
            assert_eq!(TableId::parse_name(t.name()), Some(*t));
        }
        assert_eq!(TableId::parse_name("no_such_table"), None);
    }
}
