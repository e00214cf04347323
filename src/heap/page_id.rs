use std::fmt;

/// Identifies a page: the table it belongs to and its position in the
/// table's file.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeapPageID {
    pub table_id: u32,

    /// page_index represents the position of the page in the table,
    /// start from 0
    pub page_index: u32,
}

impl HeapPageID {
    pub fn new(table_id: u32, page_index: u32) -> Self {
        Self {
            table_id,
            page_index,
        }
    }

    pub fn get_table_id(&self) -> u32 {
        self.table_id
    }

    /// The byte offset of the page in the table file.
    pub fn offset(&self, page_size: usize) -> u64 {
        self.page_index as u64 * page_size as u64
    }
}

impl fmt::Display for HeapPageID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "page_{}_{}", self.table_id, self.page_index)
    }
}

impl fmt::Debug for HeapPageID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
