use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    fs::{File, OpenOptions},
    hash::{Hash, Hasher},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use super::{buffer_pool::PAGE_SIZE, BufferPool, HeapPage, HeapPageID, HeapTableIterator};
use crate::{
    error::SmallError,
    storage::{Tuple, TupleScheme},
    transaction::{Permission, Transaction},
    types::{ResultPod, SmallResult},
    utils::{floor_div, HandyRwLock},
};

/// A table stored as an unordered sequence of fixed-size pages in a
/// single file.
///
/// Pages are never read or written directly by the query layer, every
/// access goes through the `BufferPool`.
pub struct HeapTable {
    table_id: u32,

    file_path: PathBuf,

    // the tuple descriptor of tuples in the file
    scheme: TupleScheme,

    file: Mutex<File>,

    // held while a new page is appended, so two transactions never
    // claim the same page index
    append_latch: Mutex<()>,
}

impl fmt::Display for HeapTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<HeapTable, file: {:?}, id: {}>",
            self.file_path, self.table_id
        )
    }
}

impl fmt::Debug for HeapTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl HeapTable {
    /// Open (or create) the heap file at `path`.
    ///
    /// The table id is derived from the absolute path of the file, so the
    /// same file always gets the same id.
    ///
    /// Fails when a tuple of `scheme` doesn't fit in a page.
    pub fn new<P: AsRef<Path>>(path: P, scheme: &TupleScheme) -> Result<Self, SmallError> {
        if HeapPage::calculate_slots_count(scheme) == 0 {
            return Err(SmallError::new(&format!(
                "tuple size {} of scheme {} exceeds the page size {}",
                scheme.get_size(),
                scheme,
                PAGE_SIZE
            )));
        }

        let file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .open(path.as_ref())?;

        let file_path = path.as_ref().canonicalize()?;

        let mut hasher = DefaultHasher::new();
        file_path.hash(&mut hasher);
        let table_id = hasher.finish() as u32;

        Ok(Self {
            table_id,
            file_path,
            scheme: scheme.clone(),
            file: Mutex::new(file),
            append_latch: Mutex::new(()),
        })
    }

    pub fn get_id(&self) -> u32 {
        self.table_id
    }

    pub fn get_scheme(&self) -> &TupleScheme {
        &self.scheme
    }

    pub fn get_file_path(&self) -> &Path {
        &self.file_path
    }

    fn get_file(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap()
    }

    /// The count of complete pages in the file.
    pub fn pages_count(&self) -> Result<usize, SmallError> {
        let file_size = self.get_file().metadata()?.len() as usize;
        Ok(floor_div(file_size, PAGE_SIZE))
    }

    /// Read the page from disk, bypassing the buffer pool.
    pub fn read_page(&self, pid: &HeapPageID) -> Result<HeapPage, SmallError> {
        if pid.table_id != self.table_id {
            return Err(SmallError::new(&format!("{} doesn't belong to {}", pid, self)));
        }

        let pages_count = self.pages_count()?;
        if pid.page_index as usize >= pages_count {
            return Err(SmallError::io(&format!(
                "{} is beyond the end of {} ({} pages)",
                pid, self, pages_count
            )));
        }

        let mut buf = vec![0; PAGE_SIZE];
        {
            let mut file = self.get_file();
            file.seek(SeekFrom::Start(pid.offset(PAGE_SIZE)))?;
            file.read_exact(&mut buf)?;
        }

        HeapPage::new(pid, &buf, &self.scheme)
    }

    /// Write the page to its offset in the file, the file grows when the
    /// page is the next sequential one.
    pub fn write_page(&self, page: &HeapPage) -> SmallResult {
        let data = page.get_page_data()?;
        self.write_page_data(&page.get_pid(), &data)
    }

    fn write_page_data(&self, pid: &HeapPageID, data: &[u8]) -> SmallResult {
        let mut file = self.get_file();
        file.seek(SeekFrom::Start(pid.offset(PAGE_SIZE)))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Append an empty page to the end of the file, return its id.
    fn append_empty_page(&self) -> Result<HeapPageID, SmallError> {
        let _latch = self.append_latch.lock().unwrap();

        let pid = HeapPageID::new(self.table_id, self.pages_count()? as u32);
        self.write_page_data(&pid, &HeapPage::empty_page_data())?;
        debug!("append empty page {} to {}", pid, self);
        Ok(pid)
    }

    /// Insert a tuple into the first page with an empty slot, a new page is
    /// appended when all pages are full.
    ///
    /// Return the modified page, it's not marked as dirty here.
    pub fn insert_tuple(
        &self,
        buffer_pool: &BufferPool,
        tx: &Transaction,
        tuple: &Tuple,
    ) -> ResultPod<HeapPage> {
        if !tuple.matches(&self.scheme) {
            return Err(SmallError::new(&format!(
                "tuple {} doesn't match the scheme {} of {}",
                tuple, self.scheme, self
            )));
        }

        for page_index in 0..self.pages_count()? {
            let pid = HeapPageID::new(self.table_id, page_index as u32);
            let already_locked = buffer_pool.holds_lock(tx, &pid);

            let page_rc = buffer_pool.get_page(tx, Permission::ReadWrite, &pid)?;
            if page_rc.rl().empty_slots_count() > 0 {
                page_rc.wl().insert_tuple(tuple)?;
                return Ok(page_rc);
            }

            // The page is untouched, other transactions may use it.
            if !already_locked {
                buffer_pool.release_page(tx, &pid);
            }
        }

        if HeapPage::calculate_slots_count(&self.scheme) == 0 {
            return Err(SmallError::new(&format!("{} can't hold any tuple", self)));
        }

        let pid = self.append_empty_page()?;
        let page_rc = buffer_pool.get_page(tx, Permission::ReadWrite, &pid)?;
        page_rc.wl().insert_tuple(tuple)?;
        Ok(page_rc)
    }

    /// Remove the tuple from the page its record id points to.
    ///
    /// Return the modified page, it's not marked as dirty here.
    pub fn delete_tuple(
        &self,
        buffer_pool: &BufferPool,
        tx: &Transaction,
        tuple: &Tuple,
    ) -> ResultPod<HeapPage> {
        let rid = tuple
            .get_rid()
            .ok_or_else(|| SmallError::new(&format!("tuple {} has no record id", tuple)))?;

        if rid.pid.table_id != self.table_id {
            return Err(SmallError::new(&format!(
                "tuple {} is not a member of {}",
                tuple, self
            )));
        }

        let page_rc = buffer_pool.get_page(tx, Permission::ReadWrite, &rid.pid)?;
        page_rc.wl().delete_tuple(tuple)?;
        Ok(page_rc)
    }

    /// Scan all tuples of the table through the buffer pool.
    pub fn iter(&self, buffer_pool: &Arc<BufferPool>, tx: &Transaction) -> HeapTableIterator {
        HeapTableIterator::new(buffer_pool, tx, self.table_id)
    }

    /// Drop all content of the file.
    pub fn clear(&self) -> SmallResult {
        self.get_file().set_len(0)?;
        Ok(())
    }
}
