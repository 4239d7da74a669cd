//! JSON number lexing: a hand-rolled replacement for `strtoll`/`strtod` that scans
//! a number once, classifies it as an exact integer, a double, or a lexeme too
//! precise to represent without loss, and reports exactly how many bytes it
//! consumed so the caller never has to re-scan.
//!
//! Integers are accumulated sign-folded (always as the negative magnitude) so
//! `i64::MIN` never needs a post-hoc negation that would overflow. Doubles are
//! built by accumulating up to 19 significant mantissa digits as an integer and
//! dividing by the matching power of ten, then scaling by a squared-powers-of-ten
//! table for the exponent. Numbers whose mantissa would lose precision this way,
//! or whose magnitude exceeds `i64`, fall back to [`NumberValue::Overflow`]: the
//! scan continues to the end of the lexeme without reinterpreting further digits,
//! preserving the raw text for the caller to keep verbatim.

/// Default cap on the exponent's absolute value; an exponent past this point is
/// certain to over/underflow `f64` regardless of the mantissa; see
/// [`crate::config::Limits::max_exp_abs`].
pub const MAX_EXPONENT: i32 = 511;

const CUTOFF_POS: i64 = i64::MAX / 10;
const THRESHOLD_POS: i64 = i64::MAX % 10;
const CUTOFF_NEG: i64 = i64::MIN / 10;
const THRESHOLD_NEG: i64 = -(i64::MAX % 10);

const POF_TEN: [f64; 9] = [
    10., 100., 1.0e4, 1.0e8, 1.0e16, 1.0e32, 1.0e64, 1.0e128, 1.0e256,
];
const TENS_MAP: [f64; 19] = [
    1., 10., 100., 1000., 1.0e4, 1.0e5, 1.0e6, 1.0e7, 1.0e8, 1.0e9, 1.0e10, 1.0e11, 1.0e12,
    1.0e13, 1.0e14, 1.0e15, 1.0e16, 1.0e17, 1.0e18,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Integer(i64),
    Double(f64),
    /// The lexeme is valid JSON but cannot be represented without precision loss
    /// (an integer wider than `i64`, or a mantissa of more than 19 significant
    /// digits). `consumed` still spans the whole lexeme; the caller preserves its
    /// source bytes verbatim rather than interpreting them numerically.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberResult {
    pub value: NumberValue,
    pub consumed: usize,
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

enum Stage {
    IntegerTail,
    Frac { nbeforedp: i32 },
    FracTail { rint: i64, nbeforedp: i32, nmantissa: i32 },
    Exp { dbl: f64 },
    OflInt,
    OflDec,
    OflDecExp,
    OflExp,
}

/// Scans a JSON number lexeme starting at `buf[0]`. `buf` may extend past the end
/// of the number; scanning stops at the first byte that cannot continue it.
///
/// Returns `Err(pos)` with the offset of a format error (an empty number, a
/// leading zero followed directly by another digit, a decimal point or exponent
/// with no digits after it) on malformed input.
pub fn atonum(buf: &[u8], max_exp_abs: i32) -> Result<NumberResult, usize> {
    let rlen = buf.len();
    let mut i = 0usize;
    let mut neg = false;

    if buf.first() == Some(&b'-') {
        neg = true;
        i += 1;
    }

    let first = *buf.get(i).ok_or(i)?;
    if !is_digit(first) {
        return Err(i);
    }

    let mut rint: i64;
    if first == b'0' {
        let after = i + 1;
        match buf.get(after) {
            Some(b'.') => {
                return run(
                    buf,
                    rlen,
                    after + 1,
                    neg,
                    0,
                    Stage::Frac { nbeforedp: 1 },
                    max_exp_abs,
                );
            }
            Some(b'e') | Some(b'E') => {
                return run(buf, rlen, after + 1, neg, 0, Stage::Exp { dbl: 0.0 }, max_exp_abs);
            }
            Some(&b) if is_digit(b) => return Err(after),
            _ => {
                return Ok(NumberResult {
                    value: NumberValue::Integer(0),
                    consumed: after,
                })
            }
        }
    }

    rint = if neg {
        -((first - b'0') as i64)
    } else {
        (first - b'0') as i64
    };
    i += 1;
    run(buf, rlen, i, neg, rint, Stage::IntegerTail, max_exp_abs)
}

fn run(
    buf: &[u8],
    rlen: usize,
    mut i: usize,
    neg: bool,
    mut rint: i64,
    mut stage: Stage,
    max_exp_abs: i32,
) -> Result<NumberResult, usize> {
    loop {
        match stage {
            Stage::IntegerTail => {
                while i < rlen {
                    let ch = buf[i];
                    if is_digit(ch) {
                        let d = (ch - b'0') as i64;
                        if neg {
                            if rint < CUTOFF_NEG || (rint == CUTOFF_NEG && d > -THRESHOLD_NEG) {
                                stage = Stage::OflInt;
                                break;
                            }
                            rint = rint * 10 - d;
                        } else {
                            if rint > CUTOFF_POS || (rint == CUTOFF_POS && d > THRESHOLD_POS) {
                                stage = Stage::OflInt;
                                break;
                            }
                            rint = rint * 10 + d;
                        }
                        i += 1;
                    } else if ch == b'.' {
                        let nbeforedp = if neg { (i - 1) as i32 } else { i as i32 };
                        i += 1;
                        stage = Stage::Frac { nbeforedp };
                        break;
                    } else if ch == b'e' || ch == b'E' {
                        i += 1;
                        stage = Stage::Exp { dbl: rint as f64 };
                        break;
                    } else {
                        return Ok(NumberResult {
                            value: NumberValue::Integer(rint),
                            consumed: i,
                        });
                    }
                }
                if matches!(stage, Stage::IntegerTail) {
                    return Ok(NumberResult {
                        value: NumberValue::Integer(rint),
                        consumed: i,
                    });
                }
            }
            Stage::Frac { nbeforedp } => {
                if !buf.get(i).copied().map(is_digit).unwrap_or(false) {
                    return Err(i);
                }
                stage = Stage::FracTail {
                    rint,
                    nbeforedp,
                    nmantissa: nbeforedp,
                };
            }
            Stage::FracTail {
                rint: mut rv,
                nbeforedp,
                mut nmantissa,
            } => {
                loop {
                    let Some(&ch) = buf.get(i) else { break };
                    if is_digit(ch) {
                        if nmantissa > 18 {
                            i += 1;
                            stage = Stage::OflDec;
                            break;
                        }
                        let d = (ch - b'0') as i64;
                        rv = if neg { rv * 10 - d } else { rv * 10 + d };
                    } else if ch == b'e' || ch == b'E' {
                        i += 1;
                        let dbl = rv as f64 / TENS_MAP[(nmantissa - nbeforedp) as usize];
                        stage = Stage::Exp { dbl };
                        break;
                    } else {
                        break;
                    }
                    i += 1;
                    nmantissa += 1;
                    if matches!(stage, Stage::FracTail { .. }) {
                        continue;
                    }
                }
                if let Stage::FracTail { .. } = stage {
                    let dbl = rv as f64 / TENS_MAP[(nmantissa - nbeforedp) as usize];
                    return Ok(NumberResult {
                        value: NumberValue::Double(dbl),
                        consumed: i,
                    });
                }
                rint = rv;
            }
            Stage::Exp { mut dbl } => {
                let mut neg_exp = false;
                match buf.get(i) {
                    Some(b'-') => {
                        neg_exp = true;
                        i += 1;
                    }
                    Some(b'+') => i += 1,
                    _ => {}
                }
                if !buf.get(i).copied().map(is_digit).unwrap_or(false) {
                    return Err(i);
                }
                while buf.get(i) == Some(&b'0') {
                    if i >= rlen {
                        break;
                    }
                    i += 1;
                }
                let mut rexp: i32 = 0;
                let mut overflowed_exp = false;
                while i < rlen {
                    let ch = buf[i];
                    if is_digit(ch) {
                        rexp = rexp * 10 + (ch - b'0') as i32;
                        if rexp > max_exp_abs.min(MAX_EXPONENT) {
                            overflowed_exp = true;
                            i += 1;
                            break;
                        }
                        i += 1;
                    } else {
                        break;
                    }
                }
                if overflowed_exp {
                    stage = Stage::OflExp;
                    continue;
                }
                let mut dexp = 1.0f64;
                let mut k = 0usize;
                let mut rest = rexp;
                while rest != 0 {
                    if rest & 1 != 0 {
                        dexp *= POF_TEN[k];
                    }
                    rest >>= 1;
                    k += 1;
                }
                if neg_exp {
                    dbl /= dexp;
                } else {
                    dbl *= dexp;
                }
                return Ok(NumberResult {
                    value: NumberValue::Double(dbl),
                    consumed: i,
                });
            }
            Stage::OflInt => {
                while i < rlen {
                    let ch = buf[i];
                    i += 1;
                    if is_digit(ch) {
                        continue;
                    }
                    if ch == b'.' {
                        stage = Stage::OflDec;
                        break;
                    }
                    if ch == b'e' || ch == b'E' {
                        stage = Stage::OflDecExp;
                        break;
                    }
                    i -= 1;
                    break;
                }
                if matches!(stage, Stage::OflInt) {
                    return Ok(NumberResult {
                        value: NumberValue::Overflow,
                        consumed: i,
                    });
                }
            }
            Stage::OflDec => {
                if !buf.get(i).copied().map(is_digit).unwrap_or(false) {
                    return Err(i);
                }
                i += 1;
                let mut next = None;
                while i < rlen {
                    let ch = buf[i];
                    i += 1;
                    if is_digit(ch) {
                        continue;
                    }
                    if ch == b'e' || ch == b'E' {
                        next = Some(Stage::OflDecExp);
                        break;
                    }
                    i -= 1;
                    break;
                }
                match next {
                    Some(s) => stage = s,
                    None => {
                        return Ok(NumberResult {
                            value: NumberValue::Overflow,
                            consumed: i,
                        })
                    }
                }
            }
            Stage::OflDecExp => {
                match buf.get(i) {
                    Some(b'+') | Some(b'-') => i += 1,
                    _ => {}
                }
                if !buf.get(i).copied().map(is_digit).unwrap_or(false) {
                    return Err(i);
                }
                i += 1;
                stage = Stage::OflExp;
            }
            Stage::OflExp => {
                while i < rlen {
                    let ch = buf[i];
                    i += 1;
                    if !is_digit(ch) {
                        i -= 1;
                        break;
                    }
                }
                return Ok(NumberResult {
                    value: NumberValue::Overflow,
                    consumed: i,
                });
            }
        }
    }
}
