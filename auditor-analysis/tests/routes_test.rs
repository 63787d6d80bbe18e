//! File-system route extraction and endpoint-kind filtering.

use std::path::PathBuf;

use auditor_analysis::extract::{self, FileInfo};
use auditor_analysis::parsers::ParserManager;
use auditor_analysis::scanner::Language;
use auditor_core::facts::rows::FactRow;
use auditor_core::facts::tables::TableId;
use auditor_core::traits::storage::IFactReader;
use auditor_storage::FactStore;

fn info(relative: &str, language: Language) -> FileInfo {
    FileInfo {
        path: PathBuf::from(format!("/project/{relative}")),
        relative_path: relative.to_string(),
        language,
        framework_tags: vec!["sveltekit".to_string()],
    }
}

/// Advanced route directory: group segment, optional param with a
/// matcher, rest param.
#[test]
fn advanced_route_patterns_normalize() {
    let relative = "src/routes/(auth)/[[id=uuid]]/[...rest]/+page.svelte";
    let facts = extract::extract_file(
        &info(relative, Language::Svelte),
        b"<h1>page</h1>",
        None,
    )
    .unwrap();

    let endpoints: Vec<_> = facts
        .rows(TableId::Endpoints)
        .iter()
        .filter_map(|r| match r {
            FactRow::Endpoint(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(endpoints.len(), 1);
    let route = endpoints[0];
    assert_eq!(route.pattern, "/:id?/:rest*");
    assert!(route.has_group_segments);
    assert!(route.has_optional_params);
    assert!(route.has_rest_params);

    let params: Vec<_> = facts
        .rows(TableId::EndpointParams)
        .iter()
        .filter_map(|r| match r {
            FactRow::EndpointParam(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(params.len(), 2);

    let id = params.iter().find(|p| p.name == "id").unwrap();
    assert!(id.is_optional);
    assert!(!id.is_rest);
    assert_eq!(id.matcher, "uuid");
    assert_eq!(id.segment, 0);

    let rest = params.iter().find(|p| p.name == "rest").unwrap();
    assert!(rest.is_rest);
    assert_eq!(rest.segment, 1);
}

/// Default and named form actions become POST endpoints with the
/// form-action discriminator and `?/name` patterns.
#[test]
fn form_actions_are_post_endpoints() {
    let source = "\
export const actions = {
    default: async ({ request }) => {
        return {};
    },
    login: async ({ request }) => {
        return {};
    },
};
";
    let relative = "src/routes/account/+page.server.js";
    let parsers = ParserManager::new();
    let tree = parsers
        .parse(source.as_bytes(), relative, Language::JavaScript)
        .unwrap();
    let facts = extract::extract_file(
        &info(relative, Language::JavaScript),
        source.as_bytes(),
        Some(&tree),
    )
    .unwrap();

    let endpoints: Vec<_> = facts
        .rows(TableId::Endpoints)
        .iter()
        .filter_map(|r| match r {
            FactRow::Endpoint(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(endpoints.len(), 2);
    for endpoint in &endpoints {
        assert_eq!(endpoint.method, "POST");
        assert_eq!(endpoint.endpoint_kind, "form_action");
    }
    let patterns: Vec<&str> = endpoints.iter().map(|e| e.pattern.as_str()).collect();
    assert!(patterns.contains(&"/account"));
    assert!(patterns.contains(&"/account?/login"));
}

/// Form-action endpoints are invisible to generic HTTP matching.
#[test]
fn form_actions_excluded_from_http_matching() {
    let store = FactStore::open_in_memory().unwrap();
    store
        .write_rows(
            TableId::Endpoints,
            vec![
                FactRow::Endpoint(auditor_core::facts::rows::EndpointRow {
                    file: "src/routes/account/+page.server.js".into(),
                    line: 1,
                    method: "POST".into(),
                    pattern: "/account".into(),
                    handler: "default".into(),
                    endpoint_kind: "form_action".into(),
                    has_group_segments: false,
                    has_optional_params: false,
                    has_rest_params: false,
                }),
                FactRow::Endpoint(auditor_core::facts::rows::EndpointRow {
                    file: "src/routes/api/items/+server.ts".into(),
                    line: 1,
                    method: "GET".into(),
                    pattern: "/api/items".into(),
                    handler: "GET".into(),
                    endpoint_kind: "http".into(),
                    has_group_segments: false,
                    has_optional_params: false,
                    has_rest_params: false,
                }),
            ],
        )
        .unwrap();

    let http = store.endpoints(Some("http")).unwrap();
    assert_eq!(http.len(), 1);
    assert_eq!(http[0].pattern, "/api/items");

    let form = store.endpoints(Some("form_action")).unwrap();
    assert_eq!(form.len(), 1);
    assert_eq!(form[0].pattern, "/account");
}

/// `+server` modules yield one endpoint row per exported verb.
#[test]
fn server_module_exported_verbs() {
    let source = "\
export async function GET({ url }) {
    return new Response('ok');
}

export async function POST({ request }) {
    return new Response('created');
}
";
    let relative = "src/routes/api/items/+server.ts";
    let parsers = ParserManager::new();
    let tree = parsers
        .parse(source.as_bytes(), relative, Language::TypeScript)
        .unwrap();
    let facts = extract::extract_file(
        &info(relative, Language::TypeScript),
        source.as_bytes(),
        Some(&tree),
    )
    .unwrap();

    let endpoints: Vec<_> = facts
        .rows(TableId::Endpoints)
        .iter()
        .filter_map(|r| match r {
            FactRow::Endpoint(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(endpoints.len(), 2);
    let methods: Vec<&str> = endpoints.iter().map(|e| e.method.as_str()).collect();
    assert!(methods.contains(&"GET"));
    assert!(methods.contains(&"POST"));
    for endpoint in &endpoints {
        assert_eq!(endpoint.pattern, "/api/items");
        assert_eq!(endpoint.endpoint_kind, "http");
    }
}
