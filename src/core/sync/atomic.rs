/*!
 * Interlocked Operations
 *
 * Lock-free integer and pointer operations on shared locations.
 *
 * Every operation is a single native atomic instruction (or CAS loop emitted
 * by the compiler) with `SeqCst` ordering, so each call is a full barrier and
 * no partial update is ever observable. Arithmetic wraps on overflow.
 */

use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};

/// Integer type of interlocked locations
pub type InterlockedValue = i32;

const ORDER: Ordering = Ordering::SeqCst;

/// Atomically add one; returns the new value
#[inline]
pub fn interlocked_increment(loc: &AtomicI32) -> InterlockedValue {
    loc.fetch_add(1, ORDER).wrapping_add(1)
}

/// Atomically subtract one; returns the new value
#[inline]
pub fn interlocked_decrement(loc: &AtomicI32) -> InterlockedValue {
    loc.fetch_sub(1, ORDER).wrapping_sub(1)
}

/// Atomically add `n`; returns the new value
#[inline]
pub fn interlocked_add(loc: &AtomicI32, n: InterlockedValue) -> InterlockedValue {
    loc.fetch_add(n, ORDER).wrapping_add(n)
}

/// Atomically subtract `n`; returns the new value
#[inline]
pub fn interlocked_sub(loc: &AtomicI32, n: InterlockedValue) -> InterlockedValue {
    loc.fetch_sub(n, ORDER).wrapping_sub(n)
}

/// Unconditionally store `value`; returns the previous value
#[inline]
pub fn interlocked_exchange(loc: &AtomicI32, value: InterlockedValue) -> InterlockedValue {
    loc.swap(value, ORDER)
}

/// Store `value` only if the location holds `expected`
///
/// Always returns the value observed before the attempt; the swap happened
/// iff the return value equals `expected`.
#[inline]
pub fn interlocked_compare_exchange(
    loc: &AtomicI32,
    expected: InterlockedValue,
    value: InterlockedValue,
) -> InterlockedValue {
    match loc.compare_exchange(expected, value, ORDER, ORDER) {
        Ok(prev) | Err(prev) => prev,
    }
}

/// Unconditionally store pointer `value`; returns the previous pointer
#[inline]
pub fn interlocked_exchange_pointer<T>(loc: &AtomicPtr<T>, value: *mut T) -> *mut T {
    loc.swap(value, ORDER)
}

/// Store pointer `value` only if the location holds `expected`; returns the
/// pointer observed before the attempt
#[inline]
pub fn interlocked_compare_exchange_pointer<T>(
    loc: &AtomicPtr<T>,
    expected: *mut T,
    value: *mut T,
) -> *mut T {
    match loc.compare_exchange(expected, value, ORDER, ORDER) {
        Ok(prev) | Err(prev) => prev,
    }
}

/// Integer whose read-modify-write operations are atomic
///
/// Typically used for reference counts and cross-thread counters.
///
/// # Example
///
/// ```
/// use platform_sync::InterlockedInt;
///
/// let refs = InterlockedInt::new(1);
/// assert_eq!(refs.increment(), 2);
/// assert_eq!(refs.decrement(), 1);
/// assert_eq!(refs.compare_exchange(1, 5), 1);
/// assert_eq!(refs.get(), 5);
/// ```
#[derive(Default)]
#[repr(transparent)]
pub struct InterlockedInt {
    value: AtomicI32,
}

impl InterlockedInt {
    /// Create with an initial value
    pub const fn new(value: InterlockedValue) -> Self {
        Self {
            value: AtomicI32::new(value),
        }
    }

    /// Add one; returns the new value
    #[inline]
    pub fn increment(&self) -> InterlockedValue {
        interlocked_increment(&self.value)
    }

    /// Subtract one; returns the new value
    #[inline]
    pub fn decrement(&self) -> InterlockedValue {
        interlocked_decrement(&self.value)
    }

    /// Add `n`; returns the new value
    #[inline]
    pub fn add(&self, n: InterlockedValue) -> InterlockedValue {
        interlocked_add(&self.value, n)
    }

    /// Subtract `n`; returns the new value
    #[inline]
    pub fn sub(&self, n: InterlockedValue) -> InterlockedValue {
        interlocked_sub(&self.value, n)
    }

    /// Replace the value; returns the previous value
    #[inline]
    pub fn exchange(&self, value: InterlockedValue) -> InterlockedValue {
        interlocked_exchange(&self.value, value)
    }

    /// Replace only if the current value equals `expected`; returns the
    /// previous value
    #[inline]
    pub fn compare_exchange(&self, expected: InterlockedValue, value: InterlockedValue) -> InterlockedValue {
        interlocked_compare_exchange(&self.value, expected, value)
    }

    /// Current value
    #[inline]
    pub fn get(&self) -> InterlockedValue {
        self.value.load(ORDER)
    }

    /// Overwrite the value
    #[inline]
    pub fn set(&self, value: InterlockedValue) {
        self.value.store(value, ORDER);
    }

    /// Underlying atomic location, for use with the free functions
    #[inline]
    pub fn as_atomic(&self) -> &AtomicI32 {
        &self.value
    }
}

impl fmt::Debug for InterlockedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterlockedInt").field(&self.get()).finish()
    }
}

/// Pointer-sized location with atomic exchange and compare-exchange
///
/// Only the pointer value is managed; ownership of the pointee stays with the
/// caller.
#[repr(transparent)]
pub struct InterlockedPtr<T> {
    ptr: AtomicPtr<T>,
}

impl<T> InterlockedPtr<T> {
    /// Create holding `ptr`
    pub const fn new(ptr: *mut T) -> Self {
        Self {
            ptr: AtomicPtr::new(ptr),
        }
    }

    /// Create holding null
    pub const fn null() -> Self {
        Self::new(std::ptr::null_mut())
    }

    /// Current pointer
    #[inline]
    pub fn get(&self) -> *mut T {
        self.ptr.load(ORDER)
    }

    /// Overwrite the pointer
    #[inline]
    pub fn set(&self, ptr: *mut T) {
        self.ptr.store(ptr, ORDER);
    }

    /// Replace the pointer; returns the previous one
    #[inline]
    pub fn exchange(&self, ptr: *mut T) -> *mut T {
        interlocked_exchange_pointer(&self.ptr, ptr)
    }

    /// Replace only if the current pointer equals `expected`; returns the
    /// previous pointer
    #[inline]
    pub fn compare_exchange(&self, expected: *mut T, ptr: *mut T) -> *mut T {
        interlocked_compare_exchange_pointer(&self.ptr, expected, ptr)
    }
}

impl<T> Default for InterlockedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> fmt::Debug for InterlockedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterlockedPtr").field(&self.get()).finish()
    }
}
