use std::io::{BufReader, ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cap_std::{ambient_authority, fs::Dir};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer};

use crate::{
    command::{Command, Outcome},
    database::ContactDatabase,
    Error,
};

const FILE_NAME: &str = "contacts.json";
const NEW_FILE_NAME: &str = "contacts.json.new";

/// The contact database persisted as a single JSON document.
///
/// Every mutation loads the whole document, applies one [`Command`] and replaces the
/// document by renaming a freshly written copy over it. Mutations are serialized by a
/// lock so concurrent requests within this process do not lose updates.
pub struct ContactStore {
    dir: Dir,
    lock: Mutex<()>,
}

impl ContactStore {
    pub fn new(dir: Dir) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    pub fn open(data_path: &Path) -> Result<Self> {
        let dir = Dir::open_ambient_dir(data_path, ambient_authority())
            .with_context(|| format!("Failed to open data directory {}", data_path.display()))?;

        Ok(Self::new(dir))
    }

    pub fn read(&self) -> Result<ContactDatabase> {
        let file = match self.dir.open(FILE_NAME) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Default::default()),
            Err(err) => return Err(err).context("Failed to open contacts"),
        };

        let val = serde_json::from_reader(BufReader::new(file))
            .context("Failed to deserialize contacts")?;

        Ok(val)
    }

    pub fn write(&self, db: &ContactDatabase) -> Result<()> {
        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        db.serialize(&mut serializer)?;

        let mut file = self.dir.create(NEW_FILE_NAME)?;
        file.write_all(&buf)?;
        file.sync_all()?;
        self.dir.rename(NEW_FILE_NAME, &self.dir, FILE_NAME)?;

        Ok(())
    }

    /// Loads the database, applies `command` and persists the result.
    ///
    /// Nothing is written if the command fails.
    pub fn execute(&self, command: Command) -> Result<Outcome, Error> {
        let _guard = self.lock.lock();

        let mut db = self.read()?;

        let outcome = command.apply(&mut db)?;

        self.write(&db).context("Failed to write contacts")?;

        tracing::debug!("Applied command: {}", outcome);

        Ok(outcome)
    }
}
