use std::io::Cursor;

use bit_vec::BitVec;
use log::debug;

use super::{buffer_pool::PAGE_SIZE, HeapPageID};
use crate::{
    error::SmallError,
    io::{Serializeable, SmallWriter},
    storage::{Field, RecordId, Tuple, TupleScheme},
    transaction::Transaction,
    types::SmallResult,
    utils::{ceil_div, floor_div},
};

/// A page of a heap file.
///
/// # Format
///
/// - header: one bit per slot, set if the slot is in use. Slot `i` is
///   bit `i % 8` (counting from the least significant bit) of byte
///   `i / 8`.
/// - slots: `slot_count` fixed-width tuple records in slot order, an
///   unused slot is filled with zeros.
/// - padding: zeros up to `PAGE_SIZE`.
pub struct HeapPage {
    pid: HeapPageID,

    scheme: TupleScheme,

    slot_count: usize,

    // indicate slots' status: true means occupied, false means empty
    header: BitVec,

    // all slots, `None` for an empty one
    tuples: Vec<Option<Tuple>>,

    // the transaction that last dirtied the page, `None` if the page is
    // clean
    dirty: Option<Transaction>,
}

impl HeapPage {
    /// Build a page from its on-disk bytes.
    pub fn new(pid: &HeapPageID, bytes: &[u8], scheme: &TupleScheme) -> Result<Self, SmallError> {
        if bytes.len() != PAGE_SIZE {
            return Err(SmallError::new(&format!(
                "invalid page size: {}, expect {}",
                bytes.len(),
                PAGE_SIZE
            )));
        }

        let slot_count = Self::calculate_slots_count(scheme);
        let header_size = Self::calculate_header_size(slot_count);
        let header = decode_header(&bytes[..header_size], slot_count);

        let tuple_size = scheme.get_size();
        let mut tuples = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            if !header[slot] {
                tuples.push(None);
                continue;
            }

            let start = header_size + slot * tuple_size;
            let mut reader = Cursor::new(&bytes[start..start + tuple_size]);
            let mut tuple = Tuple::decode(&mut reader, scheme)?;
            tuple.set_rid(Some(RecordId::new(*pid, slot)));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            pid: *pid,
            scheme: scheme.clone(),
            slot_count,
            header,
            tuples,
            dirty: None,
        })
    }

    /// The content of a page without any tuple, used when a table grows.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0; PAGE_SIZE]
    }

    /// Retrieve the maximum number of tuples this page can hold.
    pub fn calculate_slots_count(scheme: &TupleScheme) -> usize {
        let bits_per_tuple_including_header = scheme.get_size() * 8 + 1;
        floor_div(PAGE_SIZE * 8, bits_per_tuple_including_header)
    }

    /// The number of bytes needed to hold one bit per slot.
    pub fn calculate_header_size(slot_count: usize) -> usize {
        ceil_div(slot_count, 8)
    }

    pub fn get_pid(&self) -> HeapPageID {
        self.pid
    }

    pub fn get_scheme(&self) -> &TupleScheme {
        &self.scheme
    }

    pub fn get_slots_count(&self) -> usize {
        self.slot_count
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.header.get(slot).unwrap_or(false)
    }

    pub fn empty_slots_count(&self) -> usize {
        self.header.iter().filter(|used| !used).count()
    }

    /// Returns the number of tuples currently stored on this page
    pub fn tuples_count(&self) -> usize {
        self.slot_count - self.empty_slots_count()
    }

    pub fn get_tuple(&self, slot: usize) -> Option<&Tuple> {
        self.tuples.get(slot).and_then(|t| t.as_ref())
    }

    /// Store the tuple in the first empty slot, the stored copy gets a
    /// record id pointing to that slot.
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<RecordId, SmallError> {
        if !tuple.matches(&self.scheme) {
            return Err(SmallError::new(&format!(
                "tuple {} doesn't match the scheme {} of {}",
                tuple, self.scheme, self.pid
            )));
        }

        let slot = (0..self.slot_count)
            .find(|i| !self.is_slot_used(*i))
            .ok_or_else(|| SmallError::new(&format!("no empty slot on {}", self.pid)))?;

        // Strings longer than the disk format allows are cut here, so the
        // cached copy is the same as what a reload gives back.
        let cells = tuple
            .get_cells()
            .iter()
            .map(|cell| match cell {
                Field::String(s) => Field::new_string(s),
                other => other.clone(),
            })
            .collect();

        let rid = RecordId::new(self.pid, slot);
        let mut stored = Tuple::new(cells);
        stored.set_rid(Some(rid));
        self.tuples[slot] = Some(stored);
        self.header.set(slot, true);

        debug!("insert tuple {} into {} slot {}", tuple, self.pid, slot);
        Ok(rid)
    }

    /// Clear the slot the tuple's record id points to.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> SmallResult {
        let rid = tuple
            .get_rid()
            .ok_or_else(|| SmallError::new(&format!("tuple {} has no record id", tuple)))?;

        if rid.pid != self.pid {
            return Err(SmallError::new(&format!(
                "tuple {} is not on {}",
                tuple, self.pid
            )));
        }

        if !self.is_slot_used(rid.slot) {
            return Err(SmallError::new(&format!(
                "slot {} of {} is already empty",
                rid.slot, self.pid
            )));
        }

        self.tuples[rid.slot] = None;
        self.header.set(rid.slot, false);
        Ok(())
    }

    /// Mark the page as dirtied by `tx`, or clean when `None`.
    pub fn mark_dirty(&mut self, tx: Option<Transaction>) {
        self.dirty = tx;
    }

    /// The transaction that last dirtied the page, `None` if the page is
    /// clean.
    pub fn is_dirty(&self) -> Option<Transaction> {
        self.dirty
    }

    /// Serialize the page to exactly `PAGE_SIZE` bytes.
    pub fn get_page_data(&self) -> Result<Vec<u8>, SmallError> {
        let mut writer = SmallWriter::new_reserved(PAGE_SIZE);
        writer.write_bytes(&encode_header(&self.header));

        let empty_slot = vec![0; self.scheme.get_size()];
        for tuple in &self.tuples {
            match tuple {
                Some(t) => writer.write(t, &self.scheme),
                None => writer.write_bytes(&empty_slot),
            }
        }

        writer.into_padded_bytes(PAGE_SIZE)
    }

    /// Iterate over the stored tuples in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().flatten()
    }
}

// `BitVec` orders bits from the most significant one, the disk format
// orders them from the least significant one.
fn decode_header(bytes: &[u8], slot_count: usize) -> BitVec {
    let reversed: Vec<u8> = bytes.iter().map(|b| b.reverse_bits()).collect();
    let mut header = BitVec::from_bytes(&reversed);
    header.truncate(slot_count);
    header
}

fn encode_header(header: &BitVec) -> Vec<u8> {
    header.to_bytes().iter().map(|b| b.reverse_bits()).collect()
}
