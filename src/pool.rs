//! Thread-local reuse of writer backing buffers.
//!
//! Writers take a buffer when they first need capacity and return it on
//! finalization. Buffers above `MAX_POOLED_UNITS` are dropped instead of
//! pooled so a single oversized document does not pin memory forever.

use std::cell::RefCell;

const MAX_POOLED: usize = 4;
const MAX_POOLED_UNITS: usize = 1 << 20;

thread_local! {
    static POOL_U8: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
    static POOL_U16: RefCell<Vec<Vec<u16>>> = const { RefCell::new(Vec::new()) };
}

macro_rules! lane_pool {
    ($take:ident, $put:ident, $ty:ty, $pool:ident) => {
        pub(crate) fn $take(min_capacity: usize) -> Vec<$ty> {
            let reused = $pool.with(|p| p.borrow_mut().pop());
            match reused {
                Some(mut buf) if buf.capacity() >= min_capacity => {
                    buf.clear();
                    buf
                }
                Some(mut buf) => {
                    buf.clear();
                    buf.reserve(min_capacity);
                    buf
                }
                None => Vec::with_capacity(min_capacity),
            }
        }

        pub(crate) fn $put(buf: Vec<$ty>) {
            if buf.capacity() == 0 || buf.capacity() > MAX_POOLED_UNITS {
                return;
            }
            $pool.with(|p| {
                let mut p = p.borrow_mut();
                if p.len() < MAX_POOLED {
                    p.push(buf);
                }
            });
        }
    };
}

lane_pool!(take_u8, put_u8, u8, POOL_U8);
lane_pool!(take_u16, put_u16, u16, POOL_U16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_reused() {
        let mut buf = take_u8(64);
        buf.extend_from_slice(b"junk");
        let cap = buf.capacity();
        put_u8(buf);
        let again = take_u8(16);
        assert!(again.is_empty());
        assert!(again.capacity() >= cap.min(16));
    }

    #[test]
    fn oversized_buffers_are_dropped() {
        put_u8(Vec::with_capacity(MAX_POOLED_UNITS + 1));
        // Nothing to assert beyond "does not grow the pool"; take still works.
        let buf = take_u8(8);
        assert!(buf.capacity() >= 8);
    }
}
