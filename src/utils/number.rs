/// Integer division that rounds up, e.g. the number of header bytes needed
/// to hold one bit per slot.
pub fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Integer division that rounds down, e.g. the number of whole pages in a
/// file.
pub fn floor_div(a: usize, b: usize) -> usize {
    a / b
}
