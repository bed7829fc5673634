use crate::error::TuneError;

/// Largest integer accepted in a duration suffix (and product of divisors).
const MAX_DURATION_NUMBER: u32 = 1024;

/// Explicit accidental written before a note letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    DoubleFlat,  // __
    Flat,        // _
    Natural,     // =
    Sharp,       // ^
    DoubleSharp, // ^^
}

impl Accidental {
    /// Semitone offset applied to the natural pitch
    pub fn offset(self) -> i8 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }
}

/// Length modifier written after a note, rest or chord: `2`, `/`, `3/2`, `//`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationSuffix {
    pub multiplier: Option<u32>,
    pub divisor: Option<u32>,
}

/// A single note as written: accidental, letter, octave marks and length
#[derive(Debug, Clone, PartialEq)]
pub struct NoteToken {
    pub accidental: Option<Accidental>,
    pub letter: char,     // case is kept, lowercase is one octave up
    pub octave_marks: i32, // net count: ' = +1, , = -1
    pub duration: Option<DurationSuffix>,
}

/// Token types for the tune body
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    BarSeparator,                      // | || |] [| |: :| ::
    ChordOpen,                         // [
    ChordClose(Option<DurationSuffix>), // ] with the length shared by the whole chord
    TieMarker,                         // -
    Note(NoteToken),
    Rest(Option<DurationSuffix>), // z or x
}

/// A token with its position in the source
#[derive(Debug, Clone)]
pub struct LocatedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Lexer for tokenizing a tune body
pub struct Lexer<'a> {
    input: &'a str,
    line: usize,
    column: usize,
    position: usize,
}

fn error(line: usize, column: usize, message: impl Into<String>) -> TuneError {
    TuneError::Syntax {
        line,
        column,
        message: message.into(),
    }
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_origin(input, 1, 1)
    }

    /// Lexer whose positions start at `line`/`column` of the enclosing document,
    /// so errors point into the full tune text rather than the extracted body.
    pub fn with_origin(input: &'a str, line: usize, column: usize) -> Self {
        Self {
            input,
            line,
            column,
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input[self.position..].chars().next()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.position..].chars().nth(n)
    }

    pub fn tokenize(&mut self) -> Result<Vec<LocatedToken>, TuneError> {
        let mut tokens = Vec::new();
        // Open '[' position and how many notes it holds so far
        let mut chord: Option<(usize, usize, usize)> = None;

        while let Some(c) = self.peek() {
            let line = self.line;
            let column = self.column;

            let token = match c {
                ' ' | '\t' | '\r' | '\n' | '\\' => {
                    self.advance();
                    continue;
                }
                '%' => {
                    self.skip_comment();
                    continue;
                }
                '|' => {
                    if chord.is_some() {
                        return Err(error(line, column, "Bar line inside a chord"));
                    }
                    self.skip_barline();
                    Token::BarSeparator
                }
                ':' => {
                    if chord.is_some() {
                        return Err(error(line, column, "Bar line inside a chord"));
                    }
                    self.advance();
                    match self.peek() {
                        Some('|') | Some(':') => {
                            self.skip_barline();
                            Token::BarSeparator
                        }
                        _ => return Err(error(line, column, "Unexpected ':'")),
                    }
                }
                '[' => match self.peek_nth(1) {
                    Some('|') => {
                        if chord.is_some() {
                            return Err(error(line, column, "Bar line inside a chord"));
                        }
                        self.advance();
                        self.skip_barline();
                        Token::BarSeparator
                    }
                    Some(d) if d.is_ascii_digit() => {
                        // Variant ending marker such as [1 or [2
                        self.advance();
                        self.skip_ending_numbers();
                        continue;
                    }
                    Some(f) if f.is_ascii_alphabetic() && self.peek_nth(2) == Some(':') => {
                        return Err(error(
                            line,
                            column,
                            format!("Inline field '[{}:' is not supported", f),
                        ));
                    }
                    _ => {
                        if chord.is_some() {
                            return Err(error(line, column, "Nested chord"));
                        }
                        self.advance();
                        chord = Some((line, column, 0));
                        Token::ChordOpen
                    }
                },
                ']' => {
                    self.advance();
                    match chord.take() {
                        Some((_, _, 0)) => return Err(error(line, column, "Empty chord")),
                        Some(_) => Token::ChordClose(self.duration_suffix(line, column)?),
                        None => return Err(error(line, column, "Unmatched ']'")),
                    }
                }
                '-' => {
                    self.advance();
                    Token::TieMarker
                }
                '^' | '_' | '=' | 'A'..='G' | 'a'..='g' => {
                    if let Some((_, _, notes)) = chord.as_mut() {
                        *notes += 1;
                    }
                    Token::Note(self.note(line, column)?)
                }
                'z' | 'x' => {
                    if chord.is_some() {
                        return Err(error(line, column, "Rest inside a chord"));
                    }
                    self.advance();
                    Token::Rest(self.duration_suffix(line, column)?)
                }
                '0'..='9' | '/' => {
                    return Err(error(line, column, "Duration without a preceding note"));
                }
                '"' => {
                    self.skip_delimited('"', line, column, "Unterminated annotation")?;
                    continue;
                }
                '!' | '+' => {
                    self.skip_delimited(c, line, column, "Unterminated decoration")?;
                    continue;
                }
                '{' => {
                    // Grace notes take no time, the whole group is dropped
                    self.skip_delimited('}', line, column, "Unterminated grace note group")?;
                    continue;
                }
                '(' => {
                    if matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) {
                        return Err(error(line, column, "Tuplets are not supported"));
                    }
                    // Slur start
                    self.advance();
                    continue;
                }
                ')' | '~' | '.' | 'H' | 'L' | 'M' | 'O' | 'P' | 'S' | 'T' | 'u' | 'v' | 'y' => {
                    // Slur end and shorthand decorations
                    self.advance();
                    continue;
                }
                '>' | '<' => {
                    return Err(error(line, column, "Broken rhythm is not supported"));
                }
                _ => {
                    return Err(error(line, column, format!("Unexpected character: '{}'", c)));
                }
            };

            tokens.push(LocatedToken {
                token,
                line,
                column,
            });
        }

        if let Some((line, column, _)) = chord {
            return Err(error(line, column, "Unterminated chord"));
        }

        Ok(tokens)
    }

    fn note(&mut self, line: usize, column: usize) -> Result<NoteToken, TuneError> {
        let accidental = self.accidental();

        let letter = match self.peek() {
            Some(l @ ('A'..='G' | 'a'..='g')) => {
                self.advance();
                l
            }
            _ => return Err(error(line, column, "Accidental without a note")),
        };

        let mut octave_marks = 0;
        loop {
            match self.peek() {
                Some('\'') => octave_marks += 1,
                Some(',') => octave_marks -= 1,
                _ => break,
            }
            self.advance();
        }

        let duration = self.duration_suffix(line, column)?;

        Ok(NoteToken {
            accidental,
            letter,
            octave_marks,
            duration,
        })
    }

    fn accidental(&mut self) -> Option<Accidental> {
        let c = self.peek()?;
        let (single, double) = match c {
            '^' => (Accidental::Sharp, Accidental::DoubleSharp),
            '_' => (Accidental::Flat, Accidental::DoubleFlat),
            '=' => {
                self.advance();
                return Some(Accidental::Natural);
            }
            _ => return None,
        };
        self.advance();
        if self.peek() == Some(c) {
            self.advance();
            Some(double)
        } else {
            Some(single)
        }
    }

    /// Parse `N`, `/`, `/N`, `N/M`, `//` and friends. Each bare `/` halves the length.
    fn duration_suffix(
        &mut self,
        line: usize,
        column: usize,
    ) -> Result<Option<DurationSuffix>, TuneError> {
        let multiplier = self.number(line, column)?;

        let mut divisor: Option<u32> = None;
        while self.peek() == Some('/') {
            self.advance();
            let d = self.number(line, column)?.unwrap_or(2);
            let total = divisor.unwrap_or(1).saturating_mul(d);
            if total > MAX_DURATION_NUMBER {
                return Err(error(line, column, "Duration divisor too large"));
            }
            divisor = Some(total);
        }

        if multiplier == Some(0) || divisor == Some(0) {
            return Err(error(line, column, "Zero-length duration"));
        }

        if multiplier.is_none() && divisor.is_none() {
            Ok(None)
        } else {
            Ok(Some(DurationSuffix {
                multiplier,
                divisor,
            }))
        }
    }

    fn number(&mut self, line: usize, column: usize) -> Result<Option<u32>, TuneError> {
        let mut value: Option<u32> = None;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.advance();
            let next = value.unwrap_or(0) * 10 + digit;
            if next > MAX_DURATION_NUMBER {
                return Err(error(line, column, "Duration number too large"));
            }
            value = Some(next);
        }
        Ok(value)
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Consume a barline run (`|`, `||`, `|]`, `|:`, `:|`, `::`) and any ending numbers after it.
    fn skip_barline(&mut self) {
        while matches!(self.peek(), Some('|' | ':' | ']')) {
            self.advance();
        }
        self.skip_ending_numbers();
    }

    fn skip_ending_numbers(&mut self) {
        if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
            return;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == ',' || c == '-') {
            self.advance();
        }
    }

    fn skip_delimited(
        &mut self,
        close: char,
        line: usize,
        column: usize,
        message: &str,
    ) -> Result<(), TuneError> {
        self.advance();
        loop {
            match self.advance() {
                Some(c) if c == close => return Ok(()),
                Some(_) => {}
                None => return Err(error(line, column, message)),
            }
        }
    }
}
