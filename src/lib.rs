//! # wp-migrate
//!
//! Migrates a WordPress WXR export into a static HTML site: serialized
//! fiction becomes numbered chapter pages, selected series pages are kept
//! alongside them, and everything else worth keeping becomes a blog post
//! listed in a category index and a shared search manifest.
//!
//! # Architecture: Five-Stage Pipeline
//!
//! ```text
//! 1. Read       export.xml  →  ExportRecord stream   (taxonomy resolved)
//! 2. Classify   record      →  Bucket                (ordered rule table)
//! 3. Normalize  raw body    →  clean HTML            (entities, block markers, assets)
//! 4. Emit       record      →  <dir>/index.html      (one shared page template)
//! 5. Index      pages       →  search.json, <blog>/index.html, blog-manifest.json
//! ```
//!
//! Stages 2 to 4 are pure functions of their inputs; only the writers at the
//! end of stages 4 and 5 touch the filesystem. [`pipeline`] wires them
//! together and [`output`] turns the results into CLI text.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`export`] | Stage 1: streaming WXR reader, taxonomy tables, record assembly |
//! | [`classify`] | Stage 2: the bucket decision table |
//! | [`normalize`] | Stage 3: body cleanup, asset URL rewriting, excerpts |
//! | [`emit`] | Stage 4: destination paths, chapter sequencing, page writing |
//! | [`render`] | Maud templates for pages and the category index |
//! | [`index`] | Stage 5: search manifest merge, category sections, run manifest |
//! | [`pipeline`] | Orchestration, dry-run planning and the run report |
//! | [`config`] | `migrate.toml` loading, merging, validation and CSS generation |
//! | [`types`] | Records and dates shared by every stage |
//! | [`naming`] | Chapter slug parsing and title slugification |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Decision Table
//!
//! Classification is a const slice of named rules evaluated in order; the
//! first that returns a bucket wins. Precedence is therefore visible in one
//! place, and `check` can report which rule decided each record.
//!
//! ## Owned Slices of a Shared Manifest
//!
//! The search manifest is also written by other tools. A run replaces only
//! the entries it owns (URL under the blog root and the blog entry type) and
//! leaves every other entry untouched, so repeated runs converge to the same
//! file.
//!
//! ## Full Rebuild Every Run
//!
//! Every retained record is re-rendered and rewritten each run. Output is
//! deterministic (no timestamps, stable ordering), so a second run over the
//! same export produces a byte-identical tree. The run manifest's content
//! hashes only feed the report's unchanged count.

pub mod classify;
pub mod config;
pub mod emit;
pub mod export;
pub mod index;
pub mod naming;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
