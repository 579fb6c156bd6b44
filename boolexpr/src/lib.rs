// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Boolean expressions over the six LUT inputs `A1`..`A6`.
//!
//! A six-input look-up table is a 64-bit truth table: bit `i` is the output
//! for the input assignment where `A1` is bit 0 of `i` and `A6` is bit 5.
//! This crate converts between that table and an expression string.
//!
//! Grammar, loosest-binding first (blanks are allowed between tokens):
//!
//! ```text
//! or    := and ('+' and)*
//! and   := unary ('*' unary)*
//! unary := '~' unary | atom
//! atom  := 'A' <1-6> | '0' | '1' | '(' or ')'
//! ```

use nom::branch::alt;
use nom::character::complete::char;
use nom::character::complete::one_of;
use nom::character::complete::space0;
use nom::combinator::map;
use nom::combinator::value;
use nom::multi::fold_many0;
use nom::sequence::delimited;
use nom::sequence::preceded;
use nom::Finish;
use nom::IResult;
use remain::sorted;
use thiserror::Error;

#[sorted]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("syntax error at position {0}")]
    Syntax(usize),
    #[error("trailing characters at position {0}")]
    TrailingCharacters(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Number of LUT inputs.
pub const NUM_INPUTS: usize = 6;

/// Truth table of input `An`: bit `i` is set iff bit `n - 1` of `i` is set.
const VAR_MASKS: [u64; NUM_INPUTS] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

/// A token surrounded by optional blanks.
fn tok<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    delimited(space0, char(c), space0)
}

fn atom(s: &str) -> IResult<&str, u64> {
    let var = map(preceded(char('A'), one_of("123456")), |d| {
        VAR_MASKS[d as usize - '1' as usize]
    });
    let constant = alt((value(u64::MAX, char('1')), value(0, char('0'))));
    let parens = delimited(tok('('), or_expr, tok(')'));
    preceded(space0, alt((var, constant, parens)))(s)
}

fn unary(s: &str) -> IResult<&str, u64> {
    alt((map(preceded(tok('~'), unary), |v| !v), atom))(s)
}

fn and_expr(s: &str) -> IResult<&str, u64> {
    let (s, first) = unary(s)?;
    fold_many0(preceded(tok('*'), unary), move || first, |acc, v| acc & v)(s)
}

fn or_expr(s: &str) -> IResult<&str, u64> {
    let (s, first) = and_expr(s)?;
    fold_many0(preceded(tok('+'), and_expr), move || first, |acc, v| acc | v)(s)
}

/// Parses `input` into the truth table it denotes.
pub fn parse(input: &str) -> Result<u64> {
    let (rest, table) = or_expr(input)
        .finish()
        .map_err(|err| Error::Syntax(input.len() - err.input.len()))?;
    if !rest.trim_start().is_empty() {
        return Err(Error::TrailingCharacters(input.len() - rest.len()));
    }
    Ok(table)
}

/// Renders `table` as a canonical sum of minterms.
///
/// `parse(&render(t)) == Ok(t)` for every `t`; the result is not minimized.
pub fn render(table: u64) -> String {
    if table == 0 {
        return "0".to_string();
    }
    if table == u64::MAX {
        return "1".to_string();
    }
    let mut terms = Vec::new();
    for minterm in 0..64 {
        if table >> minterm & 1 == 0 {
            continue;
        }
        let mut lits = Vec::new();
        for input in 0..NUM_INPUTS {
            let polarity = if minterm >> input & 1 == 1 { "" } else { "~" };
            lits.push(format!("{}A{}", polarity, input + 1));
        }
        terms.push(lits.join("*"));
    }
    terms.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_vars_and_constants() {
        assert_eq!(parse("A1"), Ok(VAR_MASKS[0]));
        assert_eq!(parse("A6"), Ok(VAR_MASKS[5]));
        assert_eq!(parse("0"), Ok(0));
        assert_eq!(parse("1"), Ok(u64::MAX));
    }

    #[test]
    fn parse_operators() {
        assert_eq!(parse("A1*A2"), Ok(VAR_MASKS[0] & VAR_MASKS[1]));
        assert_eq!(parse("A1+A2"), Ok(VAR_MASKS[0] | VAR_MASKS[1]));
        assert_eq!(parse("~A3"), Ok(!VAR_MASKS[2]));
        assert_eq!(parse("~~A3"), Ok(VAR_MASKS[2]));
    }

    #[test]
    fn precedence_and_parens() {
        // '*' binds tighter than '+'.
        assert_eq!(
            parse("A1+A2*A3"),
            Ok(VAR_MASKS[0] | (VAR_MASKS[1] & VAR_MASKS[2]))
        );
        assert_eq!(
            parse("(A1+A2)*A3"),
            Ok((VAR_MASKS[0] | VAR_MASKS[1]) & VAR_MASKS[2])
        );
        // '~' binds tighter than '*'.
        assert_eq!(parse("~A1*A2"), Ok(!VAR_MASKS[0] & VAR_MASKS[1]));
        assert_eq!(parse("~(A1*A2)"), Ok(!(VAR_MASKS[0] & VAR_MASKS[1])));
    }

    #[test]
    fn blanks_are_allowed() {
        assert_eq!(parse(" A1 * ~ A2 + A3 "), parse("A1*~A2+A3"));
    }

    #[test]
    fn parse_errors() {
        // `alt` reports at the start of the atom it failed to recognize.
        assert_eq!(parse("A7"), Err(Error::Syntax(0)));
        assert_eq!(parse("*A1"), Err(Error::Syntax(0)));
        assert_eq!(parse("(A1"), Err(Error::Syntax(0)));
        // A dangling operator ends the expression before it.
        assert_eq!(parse("A1*"), Err(Error::TrailingCharacters(2)));
        assert_eq!(parse("A1)A2"), Err(Error::TrailingCharacters(2)));
    }

    #[test]
    fn render_constants() {
        assert_eq!(render(0), "0");
        assert_eq!(render(u64::MAX), "1");
    }

    #[test]
    fn render_single_minterm() {
        // Minterm 0b000011: A1 and A2 high, the rest low.
        assert_eq!(render(1 << 3), "A1*A2*~A3*~A4*~A5*~A6");
    }

    #[test]
    fn render_parse_identity() {
        for table in [
            1u64,
            VAR_MASKS[0] & VAR_MASKS[1],
            VAR_MASKS[3] | !VAR_MASKS[5],
            0x0123_4567_89AB_CDEF,
            1 << 63,
        ] {
            assert_eq!(parse(&render(table)), Ok(table), "table {table:#x}");
        }
    }
}
