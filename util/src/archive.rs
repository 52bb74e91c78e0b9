//! Struct archiving functionality
//!
//! Archiving is the observability path for cyclic modules: each module owns
//! one `Archiver` per data product and writes a timestamped CSV row per
//! cycle. A default (detached) `Archiver` silently discards data, so module
//! processing is identical whether or not archiving is attached.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;

// Internal imports
use crate::session::{get_elapsed_seconds, Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

/// A single archived row - the data product plus the session-elapsed time at
/// which it was produced.
#[derive(Serialize)]
struct Record<T: Serialize> {
    time_s: f64,
    data: T
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a timestamped csv.
///
/// To implement this trait, the struct shall have `Archiver` members which
/// shall be setup in the struct's `init` function.
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a particular path relative to the
    /// session's archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        // Create the file if it does not exist
        std::fs::File::create(session_path.clone())?;

        // Open the file in append mode
        let file = match OpenOptions::new()
            .append(true).open(session_path)
        {
            Ok(f) => f,
            Err(e) => return Err(Box::new(e))
        };

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Serialise the given data as a new timestamped row of the archive.
    ///
    /// If the archiver is detached (default constructed) this is a no-op.
    pub fn serialise<T: Serialize>(
        &mut self, data: T
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref mut writer) = self.writer {
            writer.serialize(Record {
                time_s: get_elapsed_seconds(),
                data
            })?;
            writer.flush()?;
        }

        Ok(())
    }
}
