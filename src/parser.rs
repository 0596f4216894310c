//! Command-line tokenizing: a pure function from a line of input to an
//! argv vector, optional redirection filenames, a builtin
//! classification, and a background flag.

use crate::error::{Result, ShellError};

/// Which builtin a command line names, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Quit,
    Jobs,
    Bg,
    Fg,
}

impl Builtin {
    fn classify(word: &str) -> Option<Self> {
        match word {
            "quit" => Some(Builtin::Quit),
            "jobs" => Some(Builtin::Jobs),
            "bg" => Some(Builtin::Bg),
            "fg" => Some(Builtin::Fg),
            _ => None,
        }
    }
}

/// A parsed command line.
#[derive(Debug, Clone)]
pub struct CommandLine {
    /// Program and arguments; never empty.
    pub argv: Vec<String>,
    pub infile: Option<String>,
    pub outfile: Option<String>,
    pub builtin: Option<Builtin>,
    /// Trailing `&`: run without claiming the foreground.
    pub background: bool,
}

/// Parse one line. Returns `Ok(None)` for blank input.
pub fn parse(line: &str) -> Result<Option<CommandLine>> {
    let mut tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut background = false;
    if tokens.last().map(String::as_str) == Some("&") {
        background = true;
        tokens.pop();
    } else if let Some(last) = tokens.last_mut() {
        if last.len() > 1 && last.ends_with('&') {
            background = true;
            last.pop();
        }
    }

    let mut argv = Vec::new();
    let mut infile = None;
    let mut outfile = None;
    let mut iter = tokens.into_iter();
    while let Some(tok) = iter.next() {
        match tok.as_str() {
            "<" => {
                infile = Some(iter.next().ok_or_else(|| {
                    ShellError::Parse("missing filename after `<`".to_string())
                })?);
            }
            ">" => {
                outfile = Some(iter.next().ok_or_else(|| {
                    ShellError::Parse("missing filename after `>`".to_string())
                })?);
            }
            _ if tok.starts_with('<') && tok.len() > 1 => {
                infile = Some(tok[1..].to_string());
            }
            _ if tok.starts_with('>') && tok.len() > 1 => {
                outfile = Some(tok[1..].to_string());
            }
            _ => argv.push(tok),
        }
    }

    if argv.is_empty() {
        return Ok(None);
    }

    let builtin = Builtin::classify(&argv[0]);
    Ok(Some(CommandLine {
        argv,
        infile,
        outfile,
        builtin,
        background,
    }))
}

/// Split on whitespace, treating single-quoted spans as one token.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '\'' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            _ => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(ShellError::Parse("unmatched quote".to_string()));
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}
