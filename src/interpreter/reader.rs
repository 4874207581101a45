//==================================================
// File: interpreter/reader.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: S-expression reader
// Objective: Turn source text into data values ready for evaluation
//==================================================

use std::iter::Peekable;
use std::str::Chars;

use super::errors::EvalError;
use super::value::Value;
use super::DEFAULT_MAX_DEPTH;

/// Read every datum in `source`.
pub fn read_all(source: &str) -> Result<Vec<Value>, EvalError> {
    let mut reader = Reader::new(source);
    let mut forms = Vec::new();
    while let Some(form) = reader.next_datum()? {
        forms.push(form);
    }
    Ok(forms)
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    /// Open lists and pending quotes around the datum being read.
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            depth: 0,
        }
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        if self.depth >= DEFAULT_MAX_DEPTH {
            return Err(EvalError::Syntax(format!(
                "nesting deeper than {DEFAULT_MAX_DEPTH} levels on line {}",
                self.line
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch == Some('\n') {
            self.line += 1;
        }
        ch
    }

    fn skip_atmosphere(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == ';' {
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_datum(&mut self) -> Result<Option<Value>, EvalError> {
        self.skip_atmosphere();
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };
        match ch {
            '(' => {
                self.bump();
                self.descend()?;
                let list = self.read_list()?;
                self.depth -= 1;
                Ok(Some(list))
            }
            ')' => Err(EvalError::Syntax(format!(
                "unexpected ')' on line {}",
                self.line
            ))),
            '\'' => {
                self.bump();
                self.descend()?;
                let quoted = self.next_datum()?;
                self.depth -= 1;
                match quoted {
                    Some(datum) => Ok(Some(Value::list(vec![Value::symbol("quote"), datum]))),
                    None => Err(EvalError::Syntax("quote with nothing after it".into())),
                }
            }
            '"' => {
                self.bump();
                self.read_string().map(Some)
            }
            _ => self.read_atom().map(Some),
        }
    }

    fn read_list(&mut self) -> Result<Value, EvalError> {
        let start = self.line;
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.chars.peek() {
                None => {
                    return Err(EvalError::Syntax(format!(
                        "missing ')' for list opened on line {start}"
                    )));
                }
                Some(')') => {
                    self.bump();
                    return Ok(Value::list(items));
                }
                Some(_) => {
                    if let Some(datum) = self.next_datum()? {
                        items.push(datum);
                    }
                }
            }
        }
    }

    fn read_string(&mut self) -> Result<Value, EvalError> {
        let start = self.line;
        let mut text = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(EvalError::Syntax(format!(
                        "unterminated string starting on line {start}"
                    )));
                }
                Some('"') => return Ok(Value::string(&text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => {
                        return Err(EvalError::Syntax(format!(
                            "unterminated string starting on line {start}"
                        )));
                    }
                },
                Some(ch) => text.push(ch),
            }
        }
    }

    fn read_atom(&mut self) -> Result<Value, EvalError> {
        let mut token = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | ';' | '\'') {
                break;
            }
            token.push(ch);
            self.bump();
        }
        parse_atom(&token, self.line)
    }
}

fn parse_atom(token: &str, line: usize) -> Result<Value, EvalError> {
    match token {
        "#t" | "#true" => return Ok(Value::Boolean(true)),
        "#f" | "#false" => return Ok(Value::Boolean(false)),
        _ => {}
    }
    if token.starts_with('#') {
        return Err(EvalError::Syntax(format!(
            "unknown syntax '{token}' on line {line}"
        )));
    }
    let first = token.chars().next().unwrap_or(' ');
    let numeric_start = first.is_ascii_digit() || matches!(first, '-' | '+' | '.');
    if numeric_start && token.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(value) = token.parse::<i64>() {
            return Ok(Value::Integer(value));
        }
        if let Ok(value) = token.parse::<f64>() {
            return Ok(Value::Real(value));
        }
    }
    Ok(Value::symbol(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_lists_and_sugar() {
        let forms = read_all("(define (f x) 'x) ; comment\n(f \"a b\" -2.5 #t)").expect("read");
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].to_string(), "(define (f x) 'x)");
        assert_eq!(forms[1].to_string(), "(f \"a b\" -2.5 #t)");
    }

    #[test]
    fn numbers_and_symbols() {
        let forms = read_all("1 1.5 - -x +").expect("read");
        assert_eq!(forms[0], Value::Integer(1));
        assert_eq!(forms[1], Value::Real(1.5));
        assert_eq!(forms[2], Value::symbol("-"));
        assert_eq!(forms[3], Value::symbol("-x"));
        assert_eq!(forms[4], Value::symbol("+"));
    }

    #[test]
    fn string_escapes() {
        let forms = read_all(r#""say \"hi\"\n""#).expect("read");
        assert_eq!(forms[0], Value::string("say \"hi\"\n"));
    }

    #[test]
    fn unbalanced_input_is_a_syntax_error() {
        assert!(matches!(read_all("(+ 1 2"), Err(EvalError::Syntax(_))));
        assert!(matches!(read_all(")"), Err(EvalError::Syntax(_))));
        assert!(matches!(read_all("\"open"), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn runaway_nesting_is_a_syntax_error() {
        let open = "(".repeat(200_000);
        let err = read_all(&open).expect_err("nesting limit");
        assert!(err.to_string().contains("nesting deeper than"), "{err}");
        let quotes = "'".repeat(200_000) + "x";
        assert!(matches!(read_all(&quotes), Err(EvalError::Syntax(_))));

        let fits = "(".repeat(100) + &")".repeat(100);
        assert_eq!(read_all(&fits).expect("read").len(), 1);
    }
}

//==================================================
// End of file
//==================================================
