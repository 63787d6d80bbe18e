//! `aud docs` — fetch, list, and view documentation capsules.

use std::path::Path;

use auditor_analysis::pipeline::layout;
use auditor_core::config::AuditorConfig;
use auditor_deps::docs::{store, DocsFetcher};
use auditor_deps::registry::RegistryClient;

use crate::cli::DocsAction;
use crate::exit;

pub fn run(root: &Path, action: DocsAction) -> i32 {
    let config = match AuditorConfig::load(root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: bad .pf/config.toml: {e}");
            return exit::USER_ERROR;
        }
    };
    let docs_root = layout::docs_dir(root);

    match action {
        DocsAction::Fetch {
            package,
            version,
            ecosystem,
            max_pages,
        } => {
            let mut docs_config = config.docs.clone();
            if max_pages.is_some() {
                docs_config.max_pages = max_pages;
            }

            let client = RegistryClient::new(config.deps.effective_timeout_secs());
            let base_urls = match client.pypi_doc_urls(&package) {
                Ok(urls) if !urls.is_empty() => urls,
                Ok(_) => {
                    eprintln!("error: no documentation URL known for {package}");
                    return exit::USER_ERROR;
                }
                Err(e) => {
                    eprintln!("warning: registry unavailable: {e}");
                    return exit::SUCCESS;
                }
            };

            let fetcher = DocsFetcher::new(docs_config);
            match fetcher.fetch(&docs_root, &ecosystem, &package, &version, &base_urls) {
                Ok(meta) => {
                    println!(
                        "fetched {} pages for {}@{}",
                        meta.file_count(),
                        package,
                        version
                    );
                    exit::SUCCESS
                }
                Err(e) => {
                    // External failure: degraded, not fatal.
                    eprintln!("warning: {e}");
                    exit::SUCCESS
                }
            }
        }
        DocsAction::List => {
            for (ecosystem, capsule) in store::list_capsules(&docs_root) {
                println!("{ecosystem}/{capsule}");
            }
            exit::SUCCESS
        }
        DocsAction::View {
            capsule,
            file,
            ecosystem,
        } => {
            let dir = docs_root.join(&ecosystem).join(&capsule);
            let meta = match store::load_meta(&dir) {
                Ok(meta) => meta,
                Err(_) => {
                    eprintln!("error: no capsule {ecosystem}/{capsule}");
                    return exit::USER_ERROR;
                }
            };
            let Some(target) = file.or_else(|| meta.files.first().cloned()) else {
                eprintln!("error: capsule is empty");
                return exit::USER_ERROR;
            };
            match std::fs::read_to_string(dir.join(&target)) {
                Ok(text) => {
                    println!("{text}");
                    exit::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {target}: {e}");
                    exit::USER_ERROR
                }
            }
        }
    }
}
