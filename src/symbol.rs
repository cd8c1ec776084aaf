use crate::error::JsonErrorKind;
use crate::pool;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
}

/// A code unit of the external text representation: `u8` for the UTF-8
/// lane, `u16` for the UTF-16 lane.
///
/// Readers and writers are generic over the lane and monomorphize into
/// direct calls; the trait is sealed, so no third width exists.
pub trait Sym: sealed::Sealed + Copy + Eq + Send + Sync + core::fmt::Debug + 'static {
    /// Bytes per code unit.
    const WIDTH: usize;

    fn from_ascii(b: u8) -> Self;

    /// The code unit value, zero-extended.
    fn as_u32(self) -> u32;

    /// Append the lane encoding of `s`.
    fn extend_from_str(buf: &mut Vec<Self>, s: &str);

    /// Append the lane encoding of one character.
    fn push_char(buf: &mut Vec<Self>, c: char);

    /// Decode a complete unit slice into an owned string.
    fn decode_owned(units: &[Self]) -> Result<String, JsonErrorKind>;

    /// The units viewed as UTF-8 bytes, when the lane permits it.
    fn as_utf8(units: &[Self]) -> Option<&[u8]>;

    /// The units as UTF-8 bytes for property-name dispatch. The UTF-8 lane
    /// borrows the input; the UTF-16 lane transcodes into `scratch`.
    fn name_bytes<'a>(units: &'a [Self], scratch: &'a mut Vec<u8>)
    -> Result<&'a [u8], JsonErrorKind>;

    /// Take a pooled backing buffer with at least `min_capacity` units.
    fn pool_take(min_capacity: usize) -> Vec<Self>;

    /// Return a backing buffer to the pool.
    fn pool_put(buf: Vec<Self>);
}

impl Sym for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn from_ascii(b: u8) -> Self {
        b
    }

    #[inline]
    fn as_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    fn extend_from_str(buf: &mut Vec<Self>, s: &str) {
        buf.extend_from_slice(s.as_bytes());
    }

    #[inline]
    fn push_char(buf: &mut Vec<Self>, c: char) {
        let mut tmp = [0u8; 4];
        buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
    }

    fn decode_owned(units: &[Self]) -> Result<String, JsonErrorKind> {
        core::str::from_utf8(units)
            .map(str::to_owned)
            .map_err(|_| JsonErrorKind::InvalidUtf8)
    }

    #[inline]
    fn as_utf8(units: &[Self]) -> Option<&[u8]> {
        Some(units)
    }

    fn name_bytes<'a>(
        units: &'a [Self],
        _scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], JsonErrorKind> {
        Ok(units)
    }

    fn pool_take(min_capacity: usize) -> Vec<Self> {
        pool::take_u8(min_capacity)
    }

    fn pool_put(buf: Vec<Self>) {
        pool::put_u8(buf);
    }
}

impl Sym for u16 {
    const WIDTH: usize = 2;

    #[inline]
    fn from_ascii(b: u8) -> Self {
        b as u16
    }

    #[inline]
    fn as_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    fn extend_from_str(buf: &mut Vec<Self>, s: &str) {
        buf.extend(s.encode_utf16());
    }

    #[inline]
    fn push_char(buf: &mut Vec<Self>, c: char) {
        let mut tmp = [0u16; 2];
        buf.extend_from_slice(c.encode_utf16(&mut tmp));
    }

    fn decode_owned(units: &[Self]) -> Result<String, JsonErrorKind> {
        String::from_utf16(units).map_err(|_| JsonErrorKind::InvalidUtf16)
    }

    #[inline]
    fn as_utf8(_units: &[Self]) -> Option<&[u8]> {
        None
    }

    fn name_bytes<'a>(
        units: &'a [Self],
        scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], JsonErrorKind> {
        let s = String::from_utf16(units).map_err(|_| JsonErrorKind::InvalidUtf16)?;
        scratch.clear();
        scratch.extend_from_slice(s.as_bytes());
        Ok(&scratch[..])
    }

    fn pool_take(min_capacity: usize) -> Vec<Self> {
        pool::take_u16(min_capacity)
    }

    fn pool_put(buf: Vec<Self>) {
        pool::put_u16(buf);
    }
}
