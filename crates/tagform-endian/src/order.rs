/// A byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host this crate was compiled for.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
        }
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Conversion direction between a fixed byte order and host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    LeToNative,
    BeToNative,
    NativeToLe,
    NativeToBe,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::LeToNative,
        Direction::BeToNative,
        Direction::NativeToLe,
        Direction::NativeToBe,
    ];

    /// The non-native side of the conversion.
    pub fn foreign_order(self) -> ByteOrder {
        match self {
            Direction::LeToNative | Direction::NativeToLe => ByteOrder::Little,
            Direction::BeToNative | Direction::NativeToBe => ByteOrder::Big,
        }
    }

    /// Whether elements must be byte-swapped on this host.
    pub fn needs_swap(self) -> bool {
        self.needs_swap_on(ByteOrder::native())
    }

    /// Whether elements must be byte-swapped on a host with order `host`.
    ///
    /// Swapping is symmetric, so both directions to and from the same order
    /// agree.
    pub fn needs_swap_on(self, host: ByteOrder) -> bool {
        self.foreign_order() != host
    }
}
