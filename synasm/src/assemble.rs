//! Turns tokenized source lines into the little-endian binary image the
//! engine consumes (§4.9).

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::token::{tokenize_line, Spanned};
use synacore::Opcode;

/// Assembles `source`, labeling diagnostics with `file` for rendering.
/// Processes every line even after a failure, so the caller sees every
/// diagnostic in the source rather than only the first (§7).
pub fn assemble(source: &str, file: &str) -> Result<Vec<u8>, Vec<Diagnostic>> {
    let mut words = Vec::new();
    let mut diagnostics = Vec::new();

    for (zero_based_line, line) in source.lines().enumerate() {
        let line_number = zero_based_line + 1;
        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            continue;
        }

        match assemble_line(file, line_number, line, &tokens) {
            Ok(mut emitted) => words.append(&mut emitted),
            Err(mut errs) => diagnostics.append(&mut errs),
        }
    }

    if diagnostics.is_empty() {
        let mut bytes = Vec::with_capacity(words.len() * 2);
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        Ok(bytes)
    } else {
        Err(diagnostics)
    }
}

fn assemble_line(
    file: &str,
    line_number: usize,
    source_line: &str,
    tokens: &[Spanned],
) -> Result<Vec<u16>, Vec<Diagnostic>> {
    let mnemonic = &tokens[0];
    let opcode = match Opcode::from_mnemonic(&mnemonic.text) {
        Ok(opcode) => opcode,
        Err(_) => {
            return Err(vec![Diagnostic::new(
                file,
                line_number,
                mnemonic.column,
                mnemonic.text.len(),
                source_line,
                DiagnosticKind::UnknownMnemonic(mnemonic.text.clone()),
            )])
        }
    };

    let expected = opcode.arg_count();
    let operands = &tokens[1..];

    if operands.len() > expected {
        let excess = &operands[expected];
        return Err(vec![Diagnostic::new(
            file,
            line_number,
            excess.column,
            source_line.len().saturating_sub(excess.column - 1),
            source_line,
            DiagnosticKind::TooManyArguments,
        )]);
    }

    let mut words = vec![opcode.as_word()];
    let mut diagnostics = Vec::new();

    for index in 0..expected {
        match operands.get(index) {
            Some(token) => match parse_operand(&token.text) {
                Ok(value) => words.push(value),
                Err(()) => diagnostics.push(Diagnostic::new(
                    file,
                    line_number,
                    token.column,
                    token.text.len(),
                    source_line,
                    DiagnosticKind::BadOperand(token.text.clone()),
                )),
            },
            None => diagnostics.push(Diagnostic::new(
                file,
                line_number,
                source_line.len() + 1,
                1,
                source_line,
                DiagnosticKind::BadOperand("<missing>".to_owned()),
            )),
        }
    }

    if diagnostics.is_empty() {
        Ok(words)
    } else {
        Err(diagnostics)
    }
}

fn parse_operand(text: &str) -> Result<u16, ()> {
    if let Some(register) = parse_register(text) {
        return Ok(register);
    }
    if text.starts_with('\'') {
        return parse_char_literal(text);
    }
    parse_integer_literal(text)
}

fn parse_register(text: &str) -> Option<u16> {
    let mut chars = text.chars();
    let r = chars.next()?;
    let letter = chars.next()?;
    if chars.next().is_some() || r != 'r' {
        return None;
    }
    if ('a'..='h').contains(&letter) {
        Some(32768 + (letter as u16 - 'a' as u16))
    } else {
        None
    }
}

/// The fixed escape table of §4.9.
fn escape_byte(c: char) -> Option<u8> {
    match c {
        'a' => Some(0x07),
        'b' => Some(0x08),
        'e' => Some(0x1B),
        'f' => Some(0x0C),
        'n' => Some(0x0A),
        'r' => Some(0x0D),
        't' => Some(0x09),
        'v' => Some(0x0B),
        '\\' => Some(0x5C),
        '\'' => Some(0x27),
        '"' => Some(0x22),
        '?' => Some(0x3F),
        _ => None,
    }
}

fn parse_char_literal(text: &str) -> Result<u16, ()> {
    let inner = text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).ok_or(())?;
    let mut chars = inner.chars();
    let byte = match chars.next().ok_or(())? {
        '\\' => {
            let escape = chars.next().ok_or(())?;
            escape_byte(escape).ok_or(())?
        }
        c if c.is_ascii() => c as u8,
        _ => return Err(()),
    };
    if chars.next().is_some() {
        return Err(());
    }
    Ok(byte as u16)
}

fn parse_integer_literal(text: &str) -> Result<u16, ()> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    let value: u32 = text.parse().map_err(|_| ())?;
    // §9 open-question decision: reject exactly 32768, the register
    // range's boundary value, so only `r*` syntax ever produces a
    // register reference.
    if value > 32767 {
        return Err(());
    }
    Ok(value as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_print_then_halt() {
        let bytes = assemble("out 'A'\nhalt\n", "t.asm").unwrap();
        assert_eq!(bytes, vec![19, 0, 65, 0, 0, 0]);
    }

    #[test]
    fn assembles_registers_and_integers() {
        let bytes = assemble("add ra rb 5\n", "t.asm").unwrap();
        assert_eq!(bytes, vec![9, 0, 0, 128, 1, 128, 5, 0]);
    }

    #[test]
    fn escape_literal_decodes_newline() {
        let bytes = assemble("out '\\n'\n", "t.asm").unwrap();
        assert_eq!(bytes, vec![19, 0, 10, 0]);
    }

    #[test]
    fn unknown_mnemonic_is_reported() {
        let err = assemble("jnz ra 10\n", "t.asm").unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(matches!(err[0].kind, DiagnosticKind::UnknownMnemonic(_)));
    }

    #[test]
    fn integer_literal_rejects_32768() {
        let err = assemble("push 32768\n", "t.asm").unwrap_err();
        assert!(matches!(err[0].kind, DiagnosticKind::BadOperand(_)));
    }

    #[test]
    fn too_many_arguments_is_reported() {
        let err = assemble("halt ra\n", "t.asm").unwrap_err();
        assert!(matches!(err[0].kind, DiagnosticKind::TooManyArguments));
    }

    #[test]
    fn continues_past_a_bad_line_to_report_every_diagnostic() {
        let err = assemble("jnz ra\nhalt\nwat\n", "t.asm").unwrap_err();
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let bytes = assemble("; a comment\n\nhalt\n", "t.asm").unwrap();
        assert_eq!(bytes, vec![0, 0]);
    }

    #[test]
    fn a_multibyte_character_literal_is_a_bad_operand_not_a_panic() {
        let err = assemble("out 'é'\n", "t.asm").unwrap_err();
        assert!(matches!(err[0].kind, DiagnosticKind::BadOperand(_)));
    }
}
