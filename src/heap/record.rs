//! Record addresses and payloads.

use std::fmt;
use std::ops::Deref;

/// Location of a record: page number within its heap file plus slot.
///
/// A location, not an owner. It stops naming a live record once the slot is
/// deleted or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_no: u32,
    pub slot_no: u32,
}

impl RecordId {
    #[inline]
    pub fn new(page_no: u32, slot_no: u32) -> Self {
        RecordId { page_no, slot_no }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}, {})", self.page_no, self.slot_no)
    }
}

/// A record's bytes, copied out of its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    data: Vec<u8>,
}

impl Record {
    pub fn new(data: Vec<u8>) -> Self {
        Record { data }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for Record {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Record {
    fn from(data: Vec<u8>) -> Self {
        Record::new(data)
    }
}
