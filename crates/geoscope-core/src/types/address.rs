//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Strongly typed address in the debugged process
///
/// This wrapper around `u64` keeps addresses apart from sizes, offsets and
/// element counts, which all travel through the loaders as plain integers.
///
/// Addresses serialize as plain numbers so snapshot documents stay readable.
///
/// ## Example
///
/// ```rust
/// use geoscope_core::types::Address;
///
/// let base = Address::from(0x1000);
/// let member = base + 8;
/// assert_eq!(member.offset_from(base), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Sessions report it for values that have no storage (registers,
    /// optimized-away locals); loaders treat it as "no address".
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use geoscope_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Signed byte distance from `base` to this address
    ///
    /// A member that lives before its container yields a negative offset,
    /// which layout validation rejects.
    ///
    /// ```rust
    /// use geoscope_core::types::Address;
    ///
    /// let base = Address::from(0x1000);
    /// assert_eq!(Address::from(0x1010).offset_from(base), 16);
    /// assert_eq!(Address::from(0x0ff8).offset_from(base), -8);
    /// ```
    #[allow(clippy::cast_possible_wrap)]
    pub fn offset_from(self, base: Address) -> i64
    {
        self.0.wrapping_sub(base.0) as i64
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
