//! Batched builds: several collections, one destination.
//!
//! A batch shares a single destination-directory negotiation across N
//! collections and aggregates the conflict check: every already-existing
//! target is listed in one prompt, answered once. `Overwrite` deletes all
//! conflicting packages and proceeds; `Cancel` aborts the whole batch with
//! nothing written; `SaveAs` re-prompts for a directory.
//!
//! Builds then run strictly sequentially through the same core pipeline as
//! single builds, against the same shared environment (one thumbnail cache
//! warm across collections). Policy on partial failure: fail-fast. The first
//! collection that fails aborts the remainder, and the report states exactly
//! which collections were built, which one failed, and which were skipped.

use crate::archive::package_file_name;
use crate::build::{BuildEnv, BuildError, BuildReport, ConflictChoice, DirectoryChoice, build_package};
use crate::prefs::LAST_OUTPUT_DIR_KEY;
use crate::types::{AssetCollection, filter_assets};
use std::path::PathBuf;

/// What a batch session needs next, or how it ended.
#[derive(Debug)]
pub enum BatchStep {
    /// Answer with [`BatchSession::provide_directory`].
    NeedOutputDirectory { last_used: Option<PathBuf> },
    /// These targets already exist. One answer covers them all; see
    /// [`BatchSession::resolve_conflict`].
    NeedConflictResolution { conflicts: Vec<PathBuf> },
    /// Terminal: the user backed out. Nothing was written.
    Cancelled,
    /// Terminal: the batch ran (possibly stopping early on a failure).
    Finished(BatchReport),
}

/// Per-collection outcome of a finished batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Built(BuildReport),
    Failed { collection: String, error: BuildError },
    /// Not attempted because an earlier collection failed.
    Skipped { collection: String },
}

/// Outcomes in collection order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn built(&self) -> Vec<&BuildReport> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                BatchOutcome::Built(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Option<(&str, &BuildError)> {
        self.outcomes.iter().find_map(|o| match o {
            BatchOutcome::Failed { collection, error } => Some((collection.as_str(), error)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                BatchOutcome::Skipped { collection } => Some(collection.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, BatchOutcome::Built(_)))
    }
}

enum BatchState {
    SelectingDirectory,
    ConflictPending {
        directory: PathBuf,
        conflicts: Vec<PathBuf>,
    },
    Terminal,
}

/// Resumable batch build over a list of collections.
pub struct BatchSession<'a> {
    collections: &'a [AssetCollection],
    state: BatchState,
}

impl<'a> BatchSession<'a> {
    /// Validate every collection and open a session.
    ///
    /// All collections are validated up front so an empty one is reported
    /// before any prompt — and before `Overwrite` could delete anything on
    /// behalf of a batch that cannot complete as asked.
    pub fn new(
        collections: &'a [AssetCollection],
        env: &BuildEnv,
    ) -> Result<Self, BuildError> {
        if collections.is_empty() {
            return Err(BuildError::EmptyBatch);
        }
        for collection in collections {
            if filter_assets(&collection.assets, env.asset_root).is_empty() {
                return Err(BuildError::EmptyCollection(collection.name.clone()));
            }
        }
        Ok(Self {
            collections,
            state: BatchState::SelectingDirectory,
        })
    }

    /// The opening step: ask the driver for the shared output directory.
    pub fn first_step(&self, env: &BuildEnv) -> BatchStep {
        BatchStep::NeedOutputDirectory {
            last_used: env.prefs.get(LAST_OUTPUT_DIR_KEY).map(PathBuf::from),
        }
    }

    /// Answer the directory prompt.
    pub fn provide_directory(
        &mut self,
        env: &mut BuildEnv,
        choice: DirectoryChoice,
    ) -> Result<BatchStep, BuildError> {
        if !matches!(self.state, BatchState::SelectingDirectory) {
            return Err(BuildError::UnexpectedResponse(
                "no directory selection pending",
            ));
        }
        match choice {
            DirectoryChoice::Cancel => {
                self.state = BatchState::Terminal;
                Ok(BatchStep::Cancelled)
            }
            DirectoryChoice::Select(dir) => {
                if !dir.is_dir() {
                    self.state = BatchState::Terminal;
                    return Err(BuildError::MissingDirectory(dir));
                }
                env.prefs.set(LAST_OUTPUT_DIR_KEY, &dir.to_string_lossy())?;

                let conflicts: Vec<PathBuf> = self
                    .collections
                    .iter()
                    .map(|c| dir.join(package_file_name(&c.name)))
                    .filter(|t| t.exists())
                    .collect();
                if conflicts.is_empty() {
                    self.run_all(env, dir)
                } else {
                    self.state = BatchState::ConflictPending {
                        directory: dir,
                        conflicts: conflicts.clone(),
                    };
                    Ok(BatchStep::NeedConflictResolution { conflicts })
                }
            }
        }
    }

    /// Answer the aggregated conflict prompt.
    pub fn resolve_conflict(
        &mut self,
        env: &mut BuildEnv,
        choice: ConflictChoice,
    ) -> Result<BatchStep, BuildError> {
        let (directory, conflicts) = match &self.state {
            BatchState::ConflictPending {
                directory,
                conflicts,
            } => (directory.clone(), conflicts.clone()),
            _ => return Err(BuildError::UnexpectedResponse("no conflict pending")),
        };
        match choice {
            ConflictChoice::Cancel => {
                self.state = BatchState::Terminal;
                Ok(BatchStep::Cancelled)
            }
            ConflictChoice::SaveAs => {
                self.state = BatchState::SelectingDirectory;
                Ok(BatchStep::NeedOutputDirectory {
                    last_used: env.prefs.get(LAST_OUTPUT_DIR_KEY).map(PathBuf::from),
                })
            }
            ConflictChoice::Overwrite => {
                for target in &conflicts {
                    std::fs::remove_file(target)?;
                }
                self.run_all(env, directory)
            }
        }
    }

    fn run_all(&mut self, env: &mut BuildEnv, directory: PathBuf) -> Result<BatchStep, BuildError> {
        self.state = BatchState::Terminal;

        let mut report = BatchReport::default();
        let mut aborted = false;
        for collection in self.collections {
            if aborted {
                report.outcomes.push(BatchOutcome::Skipped {
                    collection: collection.name.clone(),
                });
                continue;
            }
            let assets = filter_assets(&collection.assets, env.asset_root);
            let target = directory.join(package_file_name(&collection.name));
            match build_package(collection, &assets, &target, env) {
                Ok(built) => report.outcomes.push(BatchOutcome::Built(built)),
                Err(error) => {
                    aborted = true;
                    report.outcomes.push(BatchOutcome::Failed {
                        collection: collection.name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(BatchStep::Finished(report))
    }
}
