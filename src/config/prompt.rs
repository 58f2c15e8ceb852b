//! Interactive questions asked once before processing starts
//!
//! Generic over the input and output streams so the loops can be driven
//! from tests.

use crate::error::{DrumlessError, Result};
use crate::types::SeparationModel;
use std::io::{BufRead, Write};

fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(DrumlessError::ConfigError(
            "input closed before a choice was made".to_string(),
        ));
    }
    Ok(line.trim().to_string())
}

/// Ask which separation model to use; empty input picks the default
pub fn prompt_model<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<SeparationModel> {
    writeln!(output)?;
    writeln!(output, "Please select stem separation model:")?;
    writeln!(output, "  1. {}", SeparationModel::HtDemucsFt)?;
    writeln!(output, "  2. {} (Default)", SeparationModel::BsRoformerSw)?;
    writeln!(output, "  3. Other (enter custom model name)")?;
    writeln!(output)?;

    loop {
        let answer = read_answer(
            input,
            output,
            "Enter your choice (1/2/3) or press Enter for default [2]: ",
        )?;

        let model = match answer.as_str() {
            "" | "2" => SeparationModel::BsRoformerSw,
            "1" => SeparationModel::HtDemucsFt,
            "3" => {
                let name = read_answer(input, output, "Enter custom model name: ")?;
                if name.is_empty() {
                    writeln!(output, "Error: Model name cannot be empty. Please try again.")?;
                    continue;
                }
                SeparationModel::from_name(&name)
            }
            _ => {
                writeln!(
                    output,
                    "Invalid input. Please enter 1, 2, 3, or press Enter for default."
                )?;
                continue;
            }
        };

        writeln!(output, "Selected: {}", model)?;
        return Ok(model);
    }
}

/// Ask a y/n question until one of y, Y, n, N is entered
pub fn prompt_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    loop {
        let answer = read_answer(input, output, &format!("{} y/n or Y/N: ", question))?;
        match answer.as_str() {
            "y" | "Y" => return Ok(true),
            "n" | "N" => return Ok(false),
            _ => writeln!(output, "Invalid input. Please enter y/Y or n/N.")?,
        }
    }
}

/// Ask whether the folder is a compilation
pub fn prompt_compilation<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    prompt_yes_no(input, output, "Is this a compilation rather than one artist?")
}

/// Ask whether normalised MP3 copies are wanted
pub fn prompt_normalisation<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    writeln!(output)?;
    prompt_yes_no(
        input,
        output,
        "Would you like a normalised (-0.1dB) version of the output files to a sub folder as MP3s?",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn model_from(answers: &str) -> (Result<SeparationModel>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = prompt_model(&mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_model_default_on_enter() {
        let (model, out) = model_from("\n");
        assert_eq!(model.unwrap(), SeparationModel::BsRoformerSw);
        assert!(out.contains("Selected: BS-Roformer-SW.ckpt"));
    }

    #[test]
    fn test_model_preset_one() {
        let (model, _) = model_from("1\n");
        assert_eq!(model.unwrap(), SeparationModel::HtDemucsFt);
    }

    #[test]
    fn test_model_custom_reprompts_on_empty_name() {
        let (model, out) = model_from("3\n\n3\n  mdx_extra.th \n");
        assert_eq!(
            model.unwrap(),
            SeparationModel::Custom("mdx_extra.th".to_string())
        );
        assert!(out.contains("Model name cannot be empty"));
    }

    #[test]
    fn test_model_invalid_then_valid() {
        let (model, out) = model_from("9\nabc\n2\n");
        assert_eq!(model.unwrap(), SeparationModel::BsRoformerSw);
        assert_eq!(out.matches("Invalid input").count(), 2);
    }

    #[test]
    fn test_yes_no_strict_answers() {
        let mut input = Cursor::new(b"yes\nY\n".to_vec());
        let mut output = Vec::new();
        assert!(prompt_compilation(&mut input, &mut output).unwrap());

        let mut input = Cursor::new(b"n\n".to_vec());
        assert!(!prompt_normalisation(&mut input, &mut output).unwrap());

        let out = String::from_utf8(output).unwrap();
        assert_eq!(out.matches("Invalid input").count(), 1);
    }

    #[test]
    fn test_closed_input_is_config_error() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = prompt_compilation(&mut input, &mut output).unwrap_err();
        assert!(err.is_fatal());
    }
}
