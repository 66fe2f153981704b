//! DICOMDIR construction, validation and consistency checking
//!
//! Files are admitted into a [`DicomdirSession`] one at a time. Each file is
//! classified by its SOP class, checked against the selected
//! [`ApplicationProfile`], turned into directory records and placed into the
//! Patient / Study / Series / instance hierarchy. The finished tree is
//! written as a Basic Directory file.

pub mod api;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod policy;
pub mod record;
pub mod types;

pub use api::{AddOutcome, DicomdirSession, FileStatus};
pub use cli::report::{TextReport, TreeSummary};
pub use error::{DicomdirError, Result};
pub use record::{read_index, write_index, DirectoryIndex, DirectoryRecord, RecordId, RecordTree};
pub use types::*;
