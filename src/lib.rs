//! # modelpack
//!
//! Compiles curated collections of 3D model assets into single-file
//! distributable packages for a headset runtime. A collection is an ordered
//! list of model references with a name and an author; a package is a
//! zip-compatible `.modelpack` archive carrying a manifest, a preview
//! thumbnail, and a compiled asset bundle.
//!
//! # Architecture: Negotiate, Then Pipeline
//!
//! A build has two phases with very different shapes:
//!
//! ```text
//! 1. Negotiate   output directory + conflict resolution   (resumable, can cancel)
//! 2. Pipeline    manifest → thumbnails → bundle → archive  (runs to completion)
//! ```
//!
//! Negotiation is interactive by nature — someone has to pick a directory
//! and decide what happens to an existing package. Instead of blocking
//! dialogs, [`build::BuildSession`] and [`batch::BatchSession`] surface each
//! decision as a returned step with an enumerated set of valid responses;
//! the driving loop (the CLI here, an editor panel elsewhere, a plain test
//! everywhere else) supplies the answer. Once negotiation settles, the
//! pipeline runs synchronously to completion inside a scratch directory that
//! is cleaned up on every exit path, and the target path is only ever
//! touched by the final atomic archive write.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Collections, asset references, reference filtering |
//! | [`naming`] | Logical name resolution (collision groups, prefix trimming) |
//! | [`render`] | `Renderer` seam, placeholder, built-in flat-tint renderer |
//! | [`cache`] | Thumbnail cache: lazy memoization, whole-cache invalidation |
//! | [`manifest`] | Build manifest and package identifier derivation |
//! | [`bundle`] | `BundleCompiler` seam and the built-in zip bundle compiler |
//! | [`archive`] | Package layout constants and the atomic archive writer |
//! | [`build`] | Single-collection build session and pipeline |
//! | [`batch`] | Multi-collection builds sharing one negotiation |
//! | [`convert`] | Folder → collection definition (walks a model directory) |
//! | [`prefs`] | Persisted preferences behind a string-keyed port |
//! | [`output`] | CLI output formatting — pure `format_*` + `print_*` |
//!
//! # Design Decisions
//!
//! ## Injected Seams Over Ambient State
//!
//! The expensive and platform-bound collaborators — preview rendering,
//! bundle compilation, archive writing, preference persistence — sit behind
//! narrow traits ([`render::Renderer`], [`bundle::BundleCompiler`],
//! [`archive::ArchiveWriter`], [`prefs::PrefStore`]) collected in a
//! [`build::BuildEnv`] the caller constructs and owns. Nothing in the
//! pipeline reaches for globals, so tests run the full build against mocks
//! and an in-memory pref store.
//!
//! ## Single-Threaded Orchestration
//!
//! Builds are strictly sequential and the thumbnail cache is `!Sync` on
//! purpose. The workload is dominated by external renders and compiles, one
//! collection at a time; a threaded cache would buy contention, not speed.
//! Scratch directories are still uniquely named per run (`tempfile`) so
//! concurrent *processes* cannot collide.
//!
//! ## Zip as the Container Everywhere
//!
//! Both the outer package and the built-in bundle blob are deflate zip
//! containers. The runtime side already speaks zip, the format is
//! inspectable with stock tooling when a build goes wrong, and one
//! well-tested dependency covers both concerns.

pub mod archive;
pub mod batch;
pub mod build;
pub mod bundle;
pub mod cache;
pub mod convert;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod prefs;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
