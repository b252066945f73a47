//! # Debug Session Facade
//!
//! The interface loaders use to talk to the host debugger.
//!
//! Loaders never see a concrete debugger. They evaluate expressions, ask for
//! type sizes and read raw memory through the two traits in this module:
//!
//! - [`DebugSession`]: symbolic evaluation (value, type, address, size)
//! - [`ProcessMemory`]: raw byte reads from the target process
//!
//! ## Why two traits?
//!
//! Memory access is optional. A session that can only evaluate expressions
//! still draws everything through the parsed path; passing a
//! [`ProcessMemory`] as well unlocks the bulk memory path.
//!
//! ## Thread Safety
//!
//! Sessions are used from a single thread during a load. The loaders keep no
//! reference to a session between calls.

pub mod snapshot;

use crate::error::SessionResult;
use crate::types::Address;

/// Result of evaluating one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation
{
    /// Whether the debugger could evaluate the expression
    pub valid: bool,
    /// Declared type of the value
    pub type_name: String,
    /// Value as the debugger prints it
    pub value: String,
    /// Address of the value, if it lives in memory
    pub address: Option<Address>,
}

impl Evaluation
{
    /// An evaluation that failed.
    #[must_use]
    pub fn invalid() -> Self
    {
        Self::default()
    }

    /// A successful evaluation.
    pub fn valid(type_name: impl Into<String>, value: impl Into<String>, address: Option<Address>) -> Self
    {
        Self {
            valid: true,
            type_name: type_name.into(),
            value: value.into(),
            address,
        }
    }
}

/// Expression evaluation in the debugged process.
///
/// Implementors provide [`evaluate`](DebugSession::evaluate) and
/// [`type_size`](DebugSession::type_size); everything else has a default
/// built on top of them that hosts may override with a faster native query.
pub trait DebugSession
{
    /// Evaluate an expression in the current stack frame.
    fn evaluate(&self, expression: &str) -> Evaluation;

    /// Size in bytes of a type, `None` when unknown.
    fn type_size(&self, type_name: &str) -> Option<usize>;

    /// Declared type of an expression's value.
    fn value_type(&self, expression: &str) -> Option<String>
    {
        let evaluation = self.evaluate(expression);
        evaluation.valid.then_some(evaluation.type_name)
    }

    /// Address of an expression's value; the null address counts as none.
    fn value_address(&self, expression: &str) -> Option<Address>
    {
        let evaluation = self.evaluate(expression);
        if !evaluation.valid {
            return None;
        }
        evaluation.address.filter(|address| !address.is_null())
    }

    /// Byte offset of `to` relative to `from`, `None` when either address is unknown.
    fn address_difference(&self, from: &str, to: &str) -> Option<i64>
    {
        let base = self.value_address(from)?;
        let target = self.value_address(to)?;
        Some(target.offset_from(base))
    }

    /// Evaluate an expression as a number.
    fn load_f64(&self, expression: &str) -> Option<f64>
    {
        let evaluation = self.evaluate(expression);
        if !evaluation.valid {
            return None;
        }
        parse_numeric(&evaluation.value)
    }
}

/// Raw memory access to the debugged process.
pub trait ProcessMemory
{
    /// Read `len` bytes starting at `address`.
    ///
    /// ## Errors
    ///
    /// Returns an error when any byte of the span is unreadable.
    fn read_memory(&self, address: Address, len: usize) -> SessionResult<Vec<u8>>;
}

/// Parse a value as debuggers print numbers.
///
/// Accepts decimal and floating point text, `0x` hexadecimal, and trailing
/// annotations such as the character shown after a `char` value (`65 'A'`).
///
/// ```rust
/// use geoscope_core::session::parse_numeric;
///
/// assert_eq!(parse_numeric("3.5"), Some(3.5));
/// assert_eq!(parse_numeric("65 'A'"), Some(65.0));
/// assert_eq!(parse_numeric("0x10"), Some(16.0));
/// assert_eq!(parse_numeric("{x=1 y=2}"), None);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn parse_numeric(text: &str) -> Option<f64>
{
    let token = text.split_whitespace().next()?;
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let value = u64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -value } else { value });
    }
    let value = token.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests
{
    use super::*;

    struct Fixed;

    impl DebugSession for Fixed
    {
        fn evaluate(&self, expression: &str) -> Evaluation
        {
            match expression {
                "p" => Evaluation::valid("Pt", "{...}", Some(Address::new(0x1000))),
                "p.y" => Evaluation::valid("double", "-2", Some(Address::new(0x1008))),
                "r" => Evaluation::valid("double", "1.5", None),
                "z" => Evaluation::valid("Pt", "{...}", Some(Address::ZERO)),
                _ => Evaluation::invalid(),
            }
        }

        fn type_size(&self, _type_name: &str) -> Option<usize>
        {
            None
        }
    }

    #[test]
    fn test_parse_numeric_values()
    {
        assert_eq!(parse_numeric("-2"), Some(-2.0));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("-0x8"), Some(-8.0));
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("true"), None);
    }

    #[test]
    fn test_default_address_difference()
    {
        assert_eq!(Fixed.address_difference("p", "p.y"), Some(8));
        assert_eq!(Fixed.address_difference("p.y", "p"), Some(-8));
        assert_eq!(Fixed.address_difference("p", "r"), None);
        assert_eq!(Fixed.address_difference("p", "missing"), None);
    }

    #[test]
    fn test_null_address_is_none()
    {
        assert_eq!(Fixed.value_address("z"), None);
    }

    #[test]
    fn test_default_value_type_and_number()
    {
        assert_eq!(Fixed.value_type("p").as_deref(), Some("Pt"));
        assert_eq!(Fixed.value_type("missing"), None);
        assert_eq!(Fixed.load_f64("r"), Some(1.5));
        assert_eq!(Fixed.load_f64("p"), None);
    }
}
