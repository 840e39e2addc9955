//! A tiny line-oriented grammar for describing a compilation unit by hand, used only to drive
//! [`crate::front_end::TextFrontEnd`] for manual inspection and end-to-end testing. Not meant to
//! resemble any real source language — it exists purely to exercise [`cgraphc`]'s public API
//! without dragging in a real parser front-end.
//!
//! ```text
//! fn main pub {
//!     call a
//! }
//! fn a {
//!     call b 4 1
//!     addr b
//! }
//! fn b {
//! }
//! var p pub = addr b
//! ctor 100 {
//!     call a
//! }
//! ```

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected token {found:?}, expected {expected}")]
    Unexpected {
        line: usize,
        found: String,
        expected: &'static str,
    },
    #[error("line {line}: unterminated block (missing `{{`/`}}`)")]
    UnterminatedBlock { line: usize },
    #[error("line {line}: unknown item keyword {keyword:?}")]
    UnknownItem { line: usize, keyword: String },
    #[error("line {line}: unknown flag {flag:?}")]
    UnknownFlag { line: usize, flag: String },
    #[error("line {line}: invalid integer {text:?}")]
    BadInt { line: usize, text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionFlags {
    pub public: bool,
    pub comdat: bool,
    pub disregard_inline_limits: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableFlags {
    pub public: bool,
    pub comdat: bool,
    pub force_output: bool,
}

/// A reference-bearing atom inside a statement or initializer (the walker's `VariableRef` /
/// `FunctionAddr` shapes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefAtom {
    Addr(String),
    Ref(String),
}

/// One statement inside a function or synthesized ctor/dtor body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtSrc {
    /// `call <callee> [count [loop_depth]]`
    Call {
        callee: String,
        count: u64,
        loop_depth: u32,
    },
    /// A non-call statement: a sequence of reference atoms walked generically ("otherwise
    /// walk the entire statement with the reference walker").
    Refs(Vec<RefAtom>),
    /// `static <name> = <atom>`: a locally-declared static variable with its initializer.
    Static { name: String, init: RefAtom },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Function {
        name: String,
        flags: FunctionFlags,
        stmts: Vec<StmtSrc>,
    },
    Variable {
        name: String,
        flags: VariableFlags,
        init: Option<RefAtom>,
    },
    Ctor {
        priority: u32,
        stmts: Vec<StmtSrc>,
    },
    Dtor {
        priority: u32,
        stmts: Vec<StmtSrc>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Tokenizes and parses the whole-unit text format described in the module docs. Strips `#`
/// line comments before tokenizing, then treats `{` and `}` as standalone tokens regardless of
/// surrounding whitespace.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source);
    let mut cursor = Cursor { tokens, pos: 0 };
    let mut items = Vec::new();
    while cursor.peek().is_some() {
        items.push(parse_item(&mut cursor)?);
    }
    Ok(Program { items })
}

struct Token {
    text: String,
    line: usize,
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_text(&self) -> Option<&str> {
        self.peek().map(|t| t.text.as_str())
    }

    fn bump(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn expect(&mut self, text: &str, expected: &'static str) -> Result<(), ParseError> {
        let line = self.current_line();
        match self.bump() {
            Some(tok) if tok.text == text => Ok(()),
            Some(tok) => Err(ParseError::Unexpected {
                line,
                found: tok.text.clone(),
                expected,
            }),
            None => Err(ParseError::UnterminatedBlock { line }),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        let line = self.current_line();
        match self.bump() {
            Some(tok) if tok.text != "{" && tok.text != "}" && tok.text != "=" => {
                Ok(tok.text.clone())
            }
            Some(tok) => Err(ParseError::Unexpected {
                line,
                found: tok.text.clone(),
                expected,
            }),
            None => Err(ParseError::UnterminatedBlock { line }),
        }
    }

    fn expect_int(&mut self) -> Result<u64, ParseError> {
        let line = self.current_line();
        let text = self.expect_ident("an integer")?;
        text.parse()
            .map_err(|_| ParseError::BadInt { line, text })
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("");
        let spaced = line
            .replace('{', " { ")
            .replace('}', " } ")
            .replace('=', " = ");
        for word in spaced.split_whitespace() {
            tokens.push(Token {
                text: word.to_string(),
                line: idx + 1,
            });
        }
    }
    tokens
}

fn parse_item(cursor: &mut Cursor) -> Result<Item, ParseError> {
    let line = cursor.current_line();
    let keyword = cursor.expect_ident("an item keyword (`fn`, `var`, `ctor`, `dtor`)")?;
    match keyword.as_str() {
        "fn" => {
            let name = cursor.expect_ident("a function name")?;
            let mut flags = FunctionFlags::default();
            while let Some(text) = cursor.peek_text() {
                if text == "{" {
                    break;
                }
                let flag = cursor.expect_ident("a flag or `{`")?;
                apply_function_flag(&mut flags, &flag, line)?;
            }
            let stmts = parse_block(cursor)?;
            Ok(Item::Function { name, flags, stmts })
        }
        "var" => {
            let name = cursor.expect_ident("a variable name")?;
            let mut flags = VariableFlags::default();
            while let Some(text) = cursor.peek_text() {
                if text == "=" || text == "{" {
                    break;
                }
                let flag = cursor.expect_ident("a flag, `=`, or end of line")?;
                apply_variable_flag(&mut flags, &flag, line)?;
            }
            let init = if cursor.peek_text() == Some("=") {
                cursor.bump();
                Some(parse_ref_atom(cursor)?)
            } else {
                None
            };
            Ok(Item::Variable { name, flags, init })
        }
        "ctor" => {
            let priority = cursor.expect_int()? as u32;
            let stmts = parse_block(cursor)?;
            Ok(Item::Ctor { priority, stmts })
        }
        "dtor" => {
            let priority = cursor.expect_int()? as u32;
            let stmts = parse_block(cursor)?;
            Ok(Item::Dtor { priority, stmts })
        }
        other => Err(ParseError::UnknownItem {
            line,
            keyword: other.to_string(),
        }),
    }
}

fn apply_function_flag(flags: &mut FunctionFlags, flag: &str, line: usize) -> Result<(), ParseError> {
    match flag {
        "pub" => flags.public = true,
        "comdat" => flags.comdat = true,
        "always_inline" => flags.disregard_inline_limits = true,
        other => {
            return Err(ParseError::UnknownFlag {
                line,
                flag: other.to_string(),
            });
        }
    }
    Ok(())
}

fn apply_variable_flag(flags: &mut VariableFlags, flag: &str, line: usize) -> Result<(), ParseError> {
    match flag {
        "pub" => flags.public = true,
        "comdat" => flags.comdat = true,
        "force_output" => flags.force_output = true,
        other => {
            return Err(ParseError::UnknownFlag {
                line,
                flag: other.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_block(cursor: &mut Cursor) -> Result<Vec<StmtSrc>, ParseError> {
    cursor.expect("{", "`{`")?;
    let mut stmts = Vec::new();
    loop {
        match cursor.peek_text() {
            Some("}") => {
                cursor.bump();
                break;
            }
            Some(_) => stmts.push(parse_stmt(cursor)?),
            None => {
                return Err(ParseError::UnterminatedBlock {
                    line: cursor.current_line(),
                });
            }
        }
    }
    Ok(stmts)
}

fn parse_stmt(cursor: &mut Cursor) -> Result<StmtSrc, ParseError> {
    let line = cursor.current_line();
    let keyword = cursor.expect_ident("`call`, `static`, `addr`, or `ref`")?;
    match keyword.as_str() {
        "call" => {
            let callee = cursor.expect_ident("a callee name")?;
            let count = if matches!(cursor.peek_text(), Some(t) if t != "}" && t.parse::<u64>().is_ok())
            {
                cursor.expect_int()?
            } else {
                1
            };
            let loop_depth = if matches!(cursor.peek_text(), Some(t) if t != "}" && t.parse::<u32>().is_ok())
            {
                cursor.expect_int()? as u32
            } else {
                0
            };
            Ok(StmtSrc::Call {
                callee,
                count,
                loop_depth,
            })
        }
        "static" => {
            let name = cursor.expect_ident("a static variable name")?;
            cursor.expect("=", "`=`")?;
            let init = parse_ref_atom(cursor)?;
            Ok(StmtSrc::Static { name, init })
        }
        "addr" | "ref" => {
            cursor.pos -= 1; // put the atom keyword back for parse_ref_atom
            let mut atoms = vec![parse_ref_atom(cursor)?];
            while matches!(cursor.peek_text(), Some("addr") | Some("ref")) {
                atoms.push(parse_ref_atom(cursor)?);
            }
            Ok(StmtSrc::Refs(atoms))
        }
        other => Err(ParseError::Unexpected {
            line,
            found: other.to_string(),
            expected: "`call`, `static`, `addr`, or `ref`",
        }),
    }
}

fn parse_ref_atom(cursor: &mut Cursor) -> Result<RefAtom, ParseError> {
    let line = cursor.current_line();
    let keyword = cursor.expect_ident("`addr` or `ref`")?;
    let name = cursor.expect_ident("a declaration name")?;
    match keyword.as_str() {
        "addr" => Ok(RefAtom::Addr(name)),
        "ref" => Ok(RefAtom::Ref(name)),
        other => Err(ParseError::Unexpected {
            line,
            found: other.to_string(),
            expected: "`addr` or `ref`",
        }),
    }
}
