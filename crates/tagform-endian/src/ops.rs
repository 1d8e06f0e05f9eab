#[cfg(test)]
use std::cell::Cell;
use std::cmp::Ordering;
use std::ops::Range;

use tracing::warn;

use crate::bswap::swap_copy;
use crate::error::{EndianError, Result};
use crate::order::Direction;

/// Effective element width for a buffer of `len` bytes.
///
/// Widths other than 1, 2, 4 or 8, or widths that do not divide `len`,
/// degrade to 1 (no swapping).
pub fn element_width(width: usize, len: usize) -> usize {
    match width {
        2 | 4 | 8 if len % width == 0 => width,
        _ => 1,
    }
}

/// Element width for converting a whole scalar of `len` bytes at once.
pub fn scalar_width(len: usize) -> usize {
    element_width(len, len)
}

/// Copy `src` into `dest`, converting each `width`-byte element.
pub fn copy(direction: Direction, dest: &mut [u8], src: &[u8], width: usize) -> Result<()> {
    copy_with(direction.needs_swap(), dest, src, width)
}

/// Move `buf[src]` to `buf[dest..]`, converting each `width`-byte element.
///
/// The ranges may overlap. When a swap is required the source is staged in
/// a temporary buffer; if that allocation fails the buffer is left untouched.
pub fn move_within(
    direction: Direction,
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    width: usize,
) -> Result<()> {
    move_with(direction.needs_swap(), buf, src, dest, width)
}

/// Compare `a` and `b` as if both were first converted to host order.
///
/// Operands of different length compare over their common prefix, then by
/// length. If a temporary cannot be allocated the operands are reported as
/// [`Ordering::Equal`]; callers that need a strict answer under memory
/// pressure must compare smaller slices.
pub fn compare(direction: Direction, a: &[u8], b: &[u8], width: usize) -> Ordering {
    compare_with(direction.needs_swap(), a, b, width)
}

pub(crate) fn copy_with(swap: bool, dest: &mut [u8], src: &[u8], width: usize) -> Result<()> {
    if dest.len() != src.len() {
        return Err(EndianError::LengthMismatch {
            dest: dest.len(),
            src: src.len(),
        });
    }

    if swap {
        swap_copy(dest, src, element_width(width, src.len()));
    } else {
        dest.copy_from_slice(src);
    }

    Ok(())
}

pub(crate) fn move_with(
    swap: bool,
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    width: usize,
) -> Result<()> {
    let len = buf.len();
    if src.start > src.end || src.end > len {
        return Err(EndianError::RangeOutOfBounds {
            start: src.start,
            end: src.end,
            len,
        });
    }

    let count = src.end - src.start;
    let dest_end = match dest.checked_add(count) {
        Some(end) if end <= len => end,
        _ => {
            return Err(EndianError::RangeOutOfBounds {
                start: dest,
                end: dest.saturating_add(count),
                len,
            })
        }
    };

    if !swap {
        buf.copy_within(src, dest);
        return Ok(());
    }

    let mut staged = scratch(count)?;
    staged.extend_from_slice(&buf[src]);

    let width = element_width(width, count);
    swap_copy(&mut buf[dest..dest_end], &staged, width);
    Ok(())
}

pub(crate) fn compare_with(swap: bool, a: &[u8], b: &[u8], width: usize) -> Ordering {
    let common = a.len().min(b.len());
    let (head_a, head_b) = (&a[..common], &b[..common]);
    let width = element_width(width, common);

    let ordering = if !swap || width == 1 {
        head_a.cmp(head_b)
    } else {
        match (normalized(head_a, width), normalized(head_b, width)) {
            (Some(norm_a), Some(norm_b)) => norm_a.cmp(&norm_b),
            _ => {
                warn!(
                    len = common,
                    "compare buffer allocation failed, reporting operands as equal"
                );
                return Ordering::Equal;
            }
        }
    };

    ordering.then_with(|| a.len().cmp(&b.len()))
}

fn normalized(src: &[u8], width: usize) -> Option<Vec<u8>> {
    let mut out = scratch(src.len()).ok()?;
    out.resize(src.len(), 0);
    swap_copy(&mut out, src, width);
    Some(out)
}

/// Empty buffer with room for `len` bytes, or the reservation error.
fn scratch(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(scratch_request(len))?;
    Ok(buf)
}

#[cfg(not(test))]
fn scratch_request(len: usize) -> usize {
    len
}

#[cfg(test)]
thread_local! {
    static SCRATCH_EXHAUSTED: Cell<bool> = const { Cell::new(false) };
}

// An impossible request makes the reservation fail for real.
#[cfg(test)]
fn scratch_request(len: usize) -> usize {
    if SCRATCH_EXHAUSTED.with(Cell::get) {
        usize::MAX
    } else {
        len
    }
}

pub fn copy_le_to_native(dest: &mut [u8], src: &[u8], width: usize) -> Result<()> {
    copy(Direction::LeToNative, dest, src, width)
}

pub fn copy_be_to_native(dest: &mut [u8], src: &[u8], width: usize) -> Result<()> {
    copy(Direction::BeToNative, dest, src, width)
}

pub fn copy_native_to_le(dest: &mut [u8], src: &[u8], width: usize) -> Result<()> {
    copy(Direction::NativeToLe, dest, src, width)
}

pub fn copy_native_to_be(dest: &mut [u8], src: &[u8], width: usize) -> Result<()> {
    copy(Direction::NativeToBe, dest, src, width)
}

pub fn move_le_to_native(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    width: usize,
) -> Result<()> {
    move_within(Direction::LeToNative, buf, src, dest, width)
}

pub fn move_be_to_native(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    width: usize,
) -> Result<()> {
    move_within(Direction::BeToNative, buf, src, dest, width)
}

pub fn move_native_to_le(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    width: usize,
) -> Result<()> {
    move_within(Direction::NativeToLe, buf, src, dest, width)
}

pub fn move_native_to_be(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    width: usize,
) -> Result<()> {
    move_within(Direction::NativeToBe, buf, src, dest, width)
}

pub fn compare_le_to_native(a: &[u8], b: &[u8], width: usize) -> Ordering {
    compare(Direction::LeToNative, a, b, width)
}

pub fn compare_be_to_native(a: &[u8], b: &[u8], width: usize) -> Ordering {
    compare(Direction::BeToNative, a, b, width)
}

pub fn compare_native_to_le(a: &[u8], b: &[u8], width: usize) -> Ordering {
    compare(Direction::NativeToLe, a, b, width)
}

pub fn compare_native_to_be(a: &[u8], b: &[u8], width: usize) -> Ordering {
    compare(Direction::NativeToBe, a, b, width)
}
