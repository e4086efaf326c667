use std::fmt;

use num_bigint::BigInt;
use num_traits::FromPrimitive;

/// Numeric scalar with exact integer, unsigned, floating, and
/// arbitrary-precision representations.
///
/// Equality is numeric rather than representational: `Int(3)`, `Uint(3)`,
/// `Float(3.0)`, and `Big(3)` all compare equal. Set deduplication and value
/// equality depend on this.
#[derive(Debug, Clone)]
pub enum Number {
	/// Signed 64-bit integer.
	Int(i64),
	/// Unsigned 64-bit integer.
	Uint(u64),
	/// 64-bit float.
	Float(f64),
	/// Arbitrary-precision integer, preserved without loss.
	Big(BigInt),
}

impl Number {
	/// Parse decimal text, preferring exact integer representations.
	pub fn parse(text: &str) -> Option<Number> {
		if let Ok(value) = text.parse::<i64>() {
			return Some(Number::Int(value));
		}
		if let Ok(value) = text.parse::<u64>() {
			return Some(Number::Uint(value));
		}
		if let Ok(value) = text.parse::<BigInt>() {
			return Some(Number::Big(value));
		}
		text.parse::<f64>().ok().map(Number::Float)
	}
}

impl PartialEq for Number {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Number::Int(a), Number::Int(b)) => a == b,
			(Number::Uint(a), Number::Uint(b)) => a == b,
			(Number::Float(a), Number::Float(b)) => a == b,
			(Number::Big(a), Number::Big(b)) => a == b,
			(Number::Int(a), Number::Uint(b)) | (Number::Uint(b), Number::Int(a)) => i128::from(*a) == i128::from(*b),
			(Number::Int(a), Number::Float(f)) | (Number::Float(f), Number::Int(a)) => float_eq_big(*f, &BigInt::from(*a)),
			(Number::Uint(a), Number::Float(f)) | (Number::Float(f), Number::Uint(a)) => float_eq_big(*f, &BigInt::from(*a)),
			(Number::Int(a), Number::Big(b)) | (Number::Big(b), Number::Int(a)) => BigInt::from(*a) == *b,
			(Number::Uint(a), Number::Big(b)) | (Number::Big(b), Number::Uint(a)) => BigInt::from(*a) == *b,
			(Number::Float(f), Number::Big(b)) | (Number::Big(b), Number::Float(f)) => float_eq_big(*f, b),
		}
	}
}

fn float_eq_big(float: f64, int: &BigInt) -> bool {
	if !float.is_finite() || float.fract() != 0.0 {
		return false;
	}
	BigInt::from_f64(float).is_some_and(|converted| converted == *int)
}

impl fmt::Display for Number {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Number::Int(value) => write!(f, "{value}"),
			Number::Uint(value) => write!(f, "{value}"),
			Number::Float(value) => write!(f, "{value}"),
			Number::Big(value) => write!(f, "{value}"),
		}
	}
}

impl From<i8> for Number {
	fn from(value: i8) -> Number {
		Number::Int(i64::from(value))
	}
}

impl From<i16> for Number {
	fn from(value: i16) -> Number {
		Number::Int(i64::from(value))
	}
}

impl From<i32> for Number {
	fn from(value: i32) -> Number {
		Number::Int(i64::from(value))
	}
}

impl From<i64> for Number {
	fn from(value: i64) -> Number {
		Number::Int(value)
	}
}

impl From<isize> for Number {
	fn from(value: isize) -> Number {
		Number::Int(value as i64)
	}
}

impl From<u8> for Number {
	fn from(value: u8) -> Number {
		Number::Uint(u64::from(value))
	}
}

impl From<u16> for Number {
	fn from(value: u16) -> Number {
		Number::Uint(u64::from(value))
	}
}

impl From<u32> for Number {
	fn from(value: u32) -> Number {
		Number::Uint(u64::from(value))
	}
}

impl From<u64> for Number {
	fn from(value: u64) -> Number {
		Number::Uint(value)
	}
}

impl From<usize> for Number {
	fn from(value: usize) -> Number {
		Number::Uint(value as u64)
	}
}

impl From<f32> for Number {
	fn from(value: f32) -> Number {
		Number::Float(f64::from(value))
	}
}

impl From<f64> for Number {
	fn from(value: f64) -> Number {
		Number::Float(value)
	}
}

impl From<BigInt> for Number {
	fn from(value: BigInt) -> Number {
		Number::Big(value)
	}
}
