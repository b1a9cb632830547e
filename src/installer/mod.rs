mod install;
mod record;
mod update;

pub use install::{InstallOutcome, InstallRequest, Installer, StagedInstall};
pub use record::{InstallRecord, RECORD_FILENAME};
pub use update::{UpdateStatus, Updater};
