//! Parsing raw byte streams into a sequence of source symbols. Every
//! byte that is not one of the eight instruction characters is
//! commentary and silently dropped, but it still counts toward the
//! positions we attach to the symbols we keep.

use crate::diagnostics::Position;
use std::io::{self, Read};

#[cfg(test)]
use pretty_assertions::assert_eq;

/// The eight instruction symbols of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    MoveRight,
    MoveLeft,
    Increment,
    Decrement,
    Output,
    Input,
    LoopOpen,
    LoopClose,
}

impl SymbolKind {
    /// Recognize an instruction byte. Everything else is commentary.
    pub fn from_byte(byte: u8) -> Option<SymbolKind> {
        match byte {
            b'>' => Some(SymbolKind::MoveRight),
            b'<' => Some(SymbolKind::MoveLeft),
            b'+' => Some(SymbolKind::Increment),
            b'-' => Some(SymbolKind::Decrement),
            b'.' => Some(SymbolKind::Output),
            b',' => Some(SymbolKind::Input),
            b'[' => Some(SymbolKind::LoopOpen),
            b']' => Some(SymbolKind::LoopClose),
            _ => None,
        }
    }
}

/// One instruction symbol together with where it sat in the raw stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub position: Position,
}

/// An ordered sequence of instruction symbols, produced once by parsing
/// and then only borrowed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceProgram {
    pub symbols: Vec<Symbol>,
}

/// Parse a byte stream into a `SourceProgram`. EOF ends parsing
/// normally; only a failed read of the underlying stream is an error.
pub fn parse_from_reader<R: Read>(reader: R) -> io::Result<SourceProgram> {
    let mut symbols = Vec::new();

    for (offset, byte) in reader.bytes().enumerate() {
        push_byte(&mut symbols, offset, byte?);
    }

    Ok(SourceProgram { symbols })
}

/// Parse in-memory source text. Infallible, since slices cannot fail to
/// read; this is the entry point tests lean on.
pub fn parse(source: &str) -> SourceProgram {
    let mut symbols = Vec::new();

    for (offset, byte) in source.bytes().enumerate() {
        push_byte(&mut symbols, offset, byte);
    }

    SourceProgram { symbols }
}

fn push_byte(symbols: &mut Vec<Symbol>, offset: usize, byte: u8) {
    if let Some(kind) = SymbolKind::from_byte(byte) {
        symbols.push(Symbol {
            kind,
            position: Position::at(offset),
        });
    }
}

#[test]
fn parse_all_symbols() {
    use SymbolKind::*;

    let kinds: Vec<_> = parse("><+-.,[]")
        .symbols
        .iter()
        .map(|sym| sym.kind)
        .collect();
    assert_eq!(
        kinds,
        [
            MoveRight, MoveLeft, Increment, Decrement, Output, Input, LoopOpen, LoopClose
        ]
    );
}

#[test]
fn parse_records_positions() {
    assert_eq!(
        parse("+").symbols,
        [Symbol {
            kind: SymbolKind::Increment,
            position: Position::at(0),
        }]
    );
    assert_eq!(
        parse("+-").symbols,
        [
            Symbol {
                kind: SymbolKind::Increment,
                position: Position::at(0),
            },
            Symbol {
                kind: SymbolKind::Decrement,
                position: Position::at(1),
            }
        ]
    );
}

#[test]
fn parse_commentary_keeps_offsets() {
    // Discarded bytes still advance positions.
    assert_eq!(
        parse("ab+c-").symbols,
        [
            Symbol {
                kind: SymbolKind::Increment,
                position: Position::at(2),
            },
            Symbol {
                kind: SymbolKind::Decrement,
                position: Position::at(4),
            }
        ]
    );
}

#[test]
fn parse_pure_commentary_is_empty() {
    assert_eq!(parse("foo! bar?\n").symbols, []);
}

#[test]
fn parse_from_reader_matches_parse() {
    let text = "[->+<] hello";
    let from_reader = parse_from_reader(text.as_bytes()).unwrap();
    assert_eq!(from_reader, parse(text));
}

#[test]
fn parse_non_utf8_bytes() {
    let program = parse_from_reader(&[0xff, b'+', 0xfe][..]).unwrap();
    assert_eq!(
        program.symbols,
        [Symbol {
            kind: SymbolKind::Increment,
            position: Position::at(1),
        }]
    );
}
