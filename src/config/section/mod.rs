//! Configuration section definitions.
//!
//! Each module corresponds to a section in `cloak.toml`:
//!
//! | Module    | TOML Section | Purpose                               |
//! |-----------|--------------|---------------------------------------|
//! | `site`    | `[site]`     | Site URL and document root            |
//! | `cache`   | `[cache]`    | Cache directory, public URL, map file |
//! | `protect` | `[protect]`  | Directory policy file                 |

mod cache;
mod protect;
mod site;

pub use cache::CacheSectionConfig;
pub use protect::ProtectSectionConfig;
pub use site::SiteSectionConfig;
