//! Runtime configuration settings

use super::cli::Cli;
use super::prompt;
use crate::error::Result;
use crate::types::{AlbumContext, SeparationModel};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Runtime settings for the pipeline, fixed before the first track
#[derive(Debug, Clone)]
pub struct Settings {
    /// Folder to process
    pub root: PathBuf,
    /// Stem separation model
    pub model: SeparationModel,
    /// Compilation and normalisation decisions
    pub context: AlbumContext,
    /// Show progress bar
    pub show_progress: bool,
    /// Dry run mode - show files without processing
    pub dry_run: bool,
}

impl Settings {
    /// Build settings from CLI arguments, asking for anything not supplied
    pub fn from_cli<R: BufRead, W: Write>(
        cli: &Cli,
        input: &mut R,
        output: &mut W,
    ) -> Result<Self> {
        let model = match &cli.model {
            Some(name) => SeparationModel::from_name(name),
            None => prompt::prompt_model(input, output)?,
        };

        let is_compilation = match cli.compilation {
            Some(answer) => answer,
            None => prompt::prompt_compilation(input, output)?,
        };

        let create_normalised = match cli.normalise {
            Some(answer) => answer,
            None => prompt::prompt_normalisation(input, output)?,
        };

        Ok(Self {
            root: cli.dir.clone(),
            model,
            context: AlbumContext {
                is_compilation,
                create_normalised,
            },
            show_progress: !cli.quiet && !cli.no_progress,
            dry_run: cli.dry_run,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            model: SeparationModel::default(),
            context: AlbumContext::default(),
            show_progress: true,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Cursor;

    #[test]
    fn test_prompts_only_for_missing_answers() {
        let cli = Cli::try_parse_from(["drumless", "--model", "custom.ckpt", "--normalise", "true"])
            .unwrap();
        let mut input = Cursor::new(b"Y\n".to_vec());
        let mut output = Vec::new();

        let settings = Settings::from_cli(&cli, &mut input, &mut output).unwrap();

        assert_eq!(settings.model, SeparationModel::Custom("custom.ckpt".to_string()));
        assert!(settings.context.is_compilation);
        assert!(settings.context.create_normalised);

        let out = String::from_utf8(output).unwrap();
        assert!(out.contains("compilation"));
        assert!(!out.contains("select stem separation model"));
    }

    #[test]
    fn test_all_questions_asked_in_order() {
        let cli = Cli {
            dir: PathBuf::from("."),
            model: None,
            compilation: None,
            normalise: None,
            dry_run: false,
            verbose: 0,
            quiet: false,
            no_progress: false,
        };
        let mut input = Cursor::new(b"1\nn\ny\n".to_vec());
        let mut output = Vec::new();

        let settings = Settings::from_cli(&cli, &mut input, &mut output).unwrap();

        assert_eq!(settings.model, SeparationModel::HtDemucsFt);
        assert!(!settings.context.is_compilation);
        assert!(settings.context.create_normalised);
        assert!(settings.show_progress);

        let out = String::from_utf8(output).unwrap();
        let model_at = out.find("select stem separation model").unwrap();
        let compilation_at = out.find("compilation").unwrap();
        let normalised_at = out.find("normalised").unwrap();
        assert!(model_at < compilation_at && compilation_at < normalised_at);
    }
}
