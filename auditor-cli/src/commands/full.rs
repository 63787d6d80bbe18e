//! `aud full` — index, analyze, taint, in order.

use std::path::Path;

use crate::exit;

pub fn run(root: &Path) -> i32 {
    let code = super::index::run(root);
    if code != exit::SUCCESS {
        return code;
    }
    let code = super::analyze::run(root);
    if code != exit::SUCCESS {
        return code;
    }
    super::taint::run(root)
}
