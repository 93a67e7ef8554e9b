//! Append-only action journal: binary protobuf log.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only: no mutation, no deletion, no reordering
//!   - fsync after every write
//!   - Sequence strictly increasing (validated on append and on load)
//!   - Only accepted actions are ever written

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use crate::error::JournalError;
use crate::proto_types::ProtoActionRecord;

const MAX_FRAME_LEN: usize = 1024 * 1024;

pub struct ActionJournal {
    path: PathBuf,
    last_sequence: u64,
}

impl ActionJournal {
    /// Open or create a journal at the given path. Existing records are
    /// read to recover the last sequence number.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            Self::read_all_from_file(path)?
                .last()
                .map_or(0, |r| r.sequence)
        } else {
            0
        };

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    /// Append one record. Writes a length-prefixed frame and fsyncs.
    pub fn append(&mut self, record: &ProtoActionRecord) -> Result<(), JournalError> {
        let expected = self.last_sequence + 1;
        if record.sequence != expected {
            return Err(JournalError::SequenceViolation {
                expected,
                got: record.sequence,
            });
        }

        let buf = record.encode_to_vec();
        let len = u32::try_from(buf.len())
            .ok()
            .filter(|len| (*len as usize) <= MAX_FRAME_LEN)
            .ok_or(JournalError::InvalidFrameLength(buf.len()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_sequence = record.sequence;
        Ok(())
    }

    /// Load every record in sequence order.
    pub fn load_all(&self) -> Result<Vec<ProtoActionRecord>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    fn read_all_from_file(path: &Path) -> Result<Vec<ProtoActionRecord>, JournalError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut records: Vec<ProtoActionRecord> = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            let after = records.last().map_or(0, |r| r.sequence);
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(JournalError::InvalidFrameLength(len));
            }

            let mut frame = vec![0u8; len];
            reader.read_exact(&mut frame).map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => JournalError::Truncated { after },
                _ => JournalError::Io(e),
            })?;

            let record = ProtoActionRecord::decode(frame.as_slice())?;
            if record.sequence != after + 1 {
                return Err(JournalError::SequenceViolation {
                    expected: after + 1,
                    got: record.sequence,
                });
            }
            records.push(record);
        }

        Ok(records)
    }
}
