//! SQL built by string interpolation or concatenation.

use auditor_core::errors::AnalysisError;
use auditor_core::facts::rows::FindingRow;
use auditor_core::traits::storage::IFactReader;
use regex::Regex;

use crate::analyzers::Analyzer;

const RULE_ID: &str = "sql-string-build";

pub struct SqlStringBuild;

impl Analyzer for SqlStringBuild {
    fn id(&self) -> &'static str {
        "sql_strings"
    }

    fn run(&self, store: &dyn IFactReader) -> Result<Vec<FindingRow>, AnalysisError> {
        let sql_keyword = Regex::new(r"(?i)\b(select|insert|update|delete)\b")
            .expect("static regex");
        let mut findings = Vec::new();

        for file in store.load_files()? {
            for symbol in store.symbols_by_file(&file.path)? {
                if symbol.kind == "class" {
                    continue;
                }
                for assign in store.assignments_in(&file.path, &symbol.qualified_name)? {
                    let expr = &assign.expression;
                    let builds_sql = sql_keyword.is_match(expr)
                        && (expr.contains('+') || expr.contains("f\"") || expr.contains("f'")
                            || expr.contains(".format(") || expr.contains("${")
                            || expr.contains('%'));
                    let reads_vars = assign.read_vars != "[]";
                    if builds_sql && reads_vars {
                        findings.push(FindingRow {
                            file: assign.file.clone(),
                            line: assign.line,
                            rule_id: RULE_ID.to_string(),
                            severity: "high".to_string(),
                            message: format!(
                                "SQL statement assembled from variables into `{}`",
                                assign.target
                            ),
                            evidence: expr.clone(),
                            analyzer: "sql_strings".to_string(),
                        });
                    }
                }
            }
        }
        Ok(findings)
    }
}
