//! Path rewriting before forwarding.

use axum::http::Uri;

use crate::routing::table::{Binding, Rewrite};

/// Apply the binding's rewrite rule to `path`.
///
/// Strips exactly one anchored occurrence of the prefix. The result always
/// starts with `/`; an empty remainder becomes `/`.
pub fn rewrite(path: &str, binding: &Binding) -> String {
    let rest = match binding.rewrite_rule() {
        Rewrite::StripPrefix => path.strip_prefix(binding.prefix()).unwrap_or(path),
        Rewrite::Preserve => path,
    };

    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

/// Rewrite the path of `uri` and re-attach its query string untouched.
pub fn rewrite_path_and_query(uri: &Uri, binding: &Binding) -> String {
    let mut out = rewrite(uri.path(), binding);
    if let Some(query) = uri.query() {
        out.push('?');
        out.push_str(query);
    }
    out
}
