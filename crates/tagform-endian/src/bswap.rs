//! Element byte-swapping.
//!
//! [`swap_copy`] reverses the bytes of every `width`-sized element of `src`
//! into `dest`. Whole 32-byte blocks go through the vectorized path (AVX2 on
//! x86_64 when the CPU supports it, a fixed-size shuffle elsewhere); the tail
//! goes through the scalar path. Both produce identical bytes.

/// Bytes processed per vectorized step.
const BLOCK: usize = 32;

const fn shuffle_mask(width: usize) -> [u8; BLOCK] {
    let mut mask = [0u8; BLOCK];
    let mut i = 0;
    while i < BLOCK {
        mask[i] = ((i / width) * width + (width - 1 - i % width)) as u8;
        i += 1;
    }
    mask
}

const MASK_IDENTITY: [u8; BLOCK] = shuffle_mask(1);
const MASK_16: [u8; BLOCK] = shuffle_mask(2);
const MASK_32: [u8; BLOCK] = shuffle_mask(4);
const MASK_64: [u8; BLOCK] = shuffle_mask(8);

fn block_mask(width: usize) -> &'static [u8; BLOCK] {
    match width {
        2 => &MASK_16,
        4 => &MASK_32,
        8 => &MASK_64,
        _ => &MASK_IDENTITY,
    }
}

pub fn bswap16(x: u16) -> u16 {
    x.swap_bytes()
}

pub fn bswap32(x: u32) -> u32 {
    x.swap_bytes()
}

pub fn bswap64(x: u64) -> u64 {
    x.swap_bytes()
}

/// Name of the vectorized byte-swap path this build and CPU will use.
pub fn vectorized_path() -> &'static str {
    if !cfg!(feature = "simd") {
        return "disabled";
    }

    #[cfg(target_arch = "x86_64")]
    {
        if std::is_x86_feature_detected!("avx2") {
            return "avx2";
        }
    }

    "portable"
}

/// Swap every element of `src` into `dest`.
///
/// `dest` and `src` must have equal length and `width` must divide it.
pub(crate) fn swap_copy(dest: &mut [u8], src: &[u8], width: usize) {
    debug_assert_eq!(dest.len(), src.len());

    if width <= 1 {
        dest.copy_from_slice(src);
        return;
    }

    let done = if cfg!(feature = "simd") {
        swap_blocks(dest, src, width)
    } else {
        0
    };

    swap_copy_scalar(&mut dest[done..], &src[done..], width);
}

/// Per-element byte reversal.
pub(crate) fn swap_copy_scalar(dest: &mut [u8], src: &[u8], width: usize) {
    debug_assert_eq!(dest.len(), src.len());

    if width <= 1 {
        dest.copy_from_slice(src);
        return;
    }

    for (d, s) in dest.chunks_exact_mut(width).zip(src.chunks_exact(width)) {
        for (db, sb) in d.iter_mut().zip(s.iter().rev()) {
            *db = *sb;
        }
    }
}

/// Swap the leading whole blocks; returns the number of bytes processed.
fn swap_blocks(dest: &mut [u8], src: &[u8], width: usize) -> usize {
    let len = src.len().min(dest.len()) / BLOCK * BLOCK;
    if len == 0 {
        return 0;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if std::is_x86_feature_detected!("avx2") {
            // SAFETY: AVX2 support was verified at runtime, both slices hold
            // `len` bytes and `len` is a multiple of BLOCK.
            unsafe { avx2::swap_blocks(&mut dest[..len], &src[..len], width) };
            return len;
        }
    }

    swap_blocks_portable(&mut dest[..len], &src[..len], width);
    len
}

fn swap_blocks_portable(dest: &mut [u8], src: &[u8], width: usize) {
    let mask = block_mask(width);
    for (d, s) in dest.chunks_exact_mut(BLOCK).zip(src.chunks_exact(BLOCK)) {
        let mut out = [0u8; BLOCK];
        for (o, &idx) in out.iter_mut().zip(mask.iter()) {
            *o = s[idx as usize];
        }
        d.copy_from_slice(&out);
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::{__m256i, _mm256_loadu_si256, _mm256_shuffle_epi8, _mm256_storeu_si256};

    use super::{block_mask, BLOCK};

    /// AVX2 block swap.
    ///
    /// `_mm256_shuffle_epi8` only shuffles inside each 128-bit lane. Element
    /// widths divide 16, so no element crosses a lane and the lane-relative
    /// index is the low nibble of the block mask.
    ///
    /// # Safety
    /// The CPU must support AVX2. `dest` and `src` must have equal length, a
    /// multiple of `BLOCK`.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn swap_blocks(dest: &mut [u8], src: &[u8], width: usize) {
        let mut lane_mask = [0u8; BLOCK];
        for (l, m) in lane_mask.iter_mut().zip(block_mask(width).iter()) {
            *l = m & 0x0f;
        }
        let mask = _mm256_loadu_si256(lane_mask.as_ptr().cast::<__m256i>());

        for (d, s) in dest.chunks_exact_mut(BLOCK).zip(src.chunks_exact(BLOCK)) {
            let data = _mm256_loadu_si256(s.as_ptr().cast::<__m256i>());
            let swapped = _mm256_shuffle_epi8(data, mask);
            _mm256_storeu_si256(d.as_mut_ptr().cast::<__m256i>(), swapped);
        }
    }
}
