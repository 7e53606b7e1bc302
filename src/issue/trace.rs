//! Micro-op traces.
//!
//! One operation per line: the operation class followed by optional
//! arguments, `w<bits>` for the operand width, `@<cycles>` for a completion
//! latency supplied from outside the pool, and any number of `#<imm>`
//! operand values. Everything after `;` is a comment.
//!
//! ```text
//! IntDiv   #100, #7
//! MemRead  w64 @12   ; miss
//! ```

use super::error::{IssueError, Result};
use crate::core::op_class::OpClass;
use crate::util::precision::operand_width;
use std::fmt;

/// Operand values are measured in bytes.
const WIDTH_BLOCK: u32 = 8;

/// One operation waiting to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroOp {
    /// Program order.
    pub seq: u64,
    pub op: OpClass,
    pub width: Option<u32>,
    pub latency: Option<u32>,
    pub operands: Vec<i64>,
}

impl MicroOp {
    pub fn new(seq: u64, op: OpClass) -> Self {
        Self {
            seq,
            op,
            width: None,
            latency: None,
            operands: Vec::new(),
        }
    }
    /// Explicit width, else the width the operand values need.
    pub fn requested_width(&self) -> Option<u32> {
        self.width
            .or_else(|| operand_width(&self.operands, WIDTH_BLOCK))
    }
}

impl fmt::Display for MicroOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.seq, self.op)?;
        if let Some(width) = self.width {
            write!(f, " w{}", width)?;
        }
        if let Some(latency) = self.latency {
            write!(f, " @{}", latency)?;
        }
        for imm in self.operands.iter() {
            write!(f, " #{}", imm)?;
        }
        Ok(())
    }
}

enum Arg {
    Width(u32),
    Latency(u32),
    Imm(i64),
}

/// Parse a whole trace. Sequence numbers follow line order, starting at 0.
pub fn parse_trace(text: &str) -> Result<Vec<MicroOp>> {
    let mut ops = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let code = match line.find(';') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let tokens = text_slicer(code);
        if tokens.is_empty() {
            continue;
        }
        let err = |detail: String| IssueError::Trace {
            line: idx + 1,
            detail,
        };
        let op: OpClass = tokens[0].parse().map_err(err)?;
        let mut uop = MicroOp::new(ops.len() as u64, op);
        for token in tokens[1..].iter() {
            match arg_scan(token).map_err(err)? {
                Arg::Width(bits) => uop.width = Some(bits),
                Arg::Latency(cycles) => uop.latency = Some(cycles),
                Arg::Imm(val) => uop.operands.push(val),
            }
        }
        ops.push(uop);
    }
    Ok(ops)
}

fn arg_scan(token: &str) -> std::result::Result<Arg, String> {
    let mut chars = token.chars();
    let prefix = chars.next();
    let body = chars.as_str();
    match prefix {
        Some('w') | Some('W') => match body.parse() {
            Ok(0) => Err(String::from("Operand width must be at least 1")),
            Ok(bits) => Ok(Arg::Width(bits)),
            Err(_) => Err(format!("Expect a width in bits, found {}", body)),
        },
        Some('@') => body
            .parse()
            .map(Arg::Latency)
            .map_err(|_| format!("Expect a latency in cycles, found {}", body)),
        Some('#') => parse_imm(body)
            .map(Arg::Imm)
            .ok_or_else(|| format!("Expect an integer, found {}", body)),
        _ => Err(format!("Invalid argument {}", token)),
    }
}

fn parse_imm(body: &str) -> Option<i64> {
    let (negative, digits) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (radix, digits) = match digits.strip_prefix("0x") {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // from_str_radix takes its own sign, which would allow "--5"
    if digits.starts_with(|c: char| c == '-' || c == '+') {
        return None;
    }
    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}

fn text_slicer(txt: &str) -> Vec<&str> {
    let delimiters = [' ', '\t', ','];
    txt.split(|c| delimiters.contains(&c))
        .filter(|t| !t.is_empty())
        .collect()
}
