//! Encode and decode commands for grid characters.

use utfgrid::codec::{decode, encode, encode_char, encode_row, is_reserved, CODE_OFFSET, MAX_INDEX};

use crate::error::CliError;

/// Print the grid character for each index.
pub fn run_encode(indices: &[u32]) -> Result<(), CliError> {
    if let Some(bad) = indices.iter().find(|&&i| i > MAX_INDEX) {
        return Err(CliError::Input(format!(
            "index {} exceeds the maximum of {}",
            bad, MAX_INDEX
        )));
    }

    for &index in indices {
        match encode_char(index) {
            Some(c) => println!("{:>6} -> U+{:04X} {:?}", index, encode(index), c),
            None => println!(
                "{:>6} -> U+{:04X} (not representable as a single character)",
                index,
                encode(index)
            ),
        }
    }

    if let Some(row) = encode_row(indices) {
        println!();
        println!("Row: \"{}\"", row);
    }
    Ok(())
}

/// Print the index each grid character stands for.
pub fn run_decode(text: &str) -> Result<(), CliError> {
    for unit in text.encode_utf16() {
        let code = unit as u32;
        if code < CODE_OFFSET {
            return Err(CliError::Input(format!(
                "U+{:04X} is a control character, not a grid character",
                code
            )));
        }
        let shown = char::from_u32(code)
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "(surrogate)".to_string());
        if is_reserved(code) {
            println!("{:<10} U+{:04X} -> reserved", shown, code);
        } else {
            println!("{:<10} U+{:04X} -> {}", shown, code, decode(code));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rejects_large_index() {
        assert!(matches!(
            run_encode(&[MAX_INDEX + 1]),
            Err(CliError::Input(_))
        ));
        assert!(run_encode(&[0, 1, 2]).is_ok());
    }

    #[test]
    fn test_decode_rejects_control_characters() {
        assert!(matches!(run_decode("\t"), Err(CliError::Input(_))));
        assert!(run_decode(" !#").is_ok());
    }
}
