//! URL rewriters.
//!
//! Every rewriter follows the same rule: if a URL is eligible and its cached
//! copy is available, substitute the cached URL; otherwise leave the input
//! exactly as it was.
//!
//! - `registration`: queued scripts and stylesheets, before rendering
//! - `attr`: single URL filters (stylesheet, script, attachment)
//! - `srcset`: responsive image candidate lists
//! - `output`: whole rendered documents and content fragments
//! - `tag`: cleanup of individual rendered tags

mod attr;
mod output;
mod registration;
mod srcset;
pub mod tag;


pub use attr::{attachment_url, rewrite_url, script_src, style_src};
pub use output::{process_content, process_output};
pub use registration::{process_assets, rewrite_registered};
pub use srcset::{SrcsetCandidate, format_srcset, parse_srcset, rewrite_srcset, rewrite_srcset_attr};
pub use tag::{sanitize_script_tag, sanitize_style_tag, strip_version_query};
