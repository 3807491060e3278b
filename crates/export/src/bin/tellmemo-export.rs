//! Render a summary JSON file to one or all export formats.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tellmemo_core::TracingNotifier;
use tellmemo_export::{Destination, ExportFormat, ExportService, summary_from_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    All,
    Pdf,
    #[value(alias = "word", alias = "html")]
    Docx,
    #[value(alias = "md")]
    Markdown,
    Json,
}

impl FormatArg {
    fn formats(self) -> Vec<ExportFormat> {
        match self {
            FormatArg::All => ExportFormat::ALL.to_vec(),
            FormatArg::Pdf => vec![ExportFormat::Pdf],
            FormatArg::Docx => vec![ExportFormat::Docx],
            FormatArg::Markdown => vec![ExportFormat::Markdown],
            FormatArg::Json => vec![ExportFormat::Json],
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tellmemo-export", about = "Render a TellMeMo summary to PDF, Word, Markdown or JSON")]
struct CliArgs {
    /// Summary JSON, as written by the JSON export.
    input: PathBuf,

    #[arg(value_enum, default_value = "all")]
    format: FormatArg,

    /// Directory the exports are written into.
    #[arg(default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    tellmemo_observability::init();

    let bytes = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let summary = summary_from_json(&bytes)
        .with_context(|| format!("parsing summary from {}", args.input.display()))?;

    let service = ExportService::new(Arc::new(TracingNotifier));
    let destination = Destination::Directory(args.out_dir);
    for format in args.format.formats() {
        let delivered = service
            .export(&summary, format, &destination)
            .with_context(|| format!("{} export of {:?}", format.label(), summary.subject))?;
        println!("{}", delivered.describe());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn help_is_not_an_input_path() {
        let err = CliArgs::try_parse_from(["tellmemo-export", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn defaults_to_all_formats_in_cwd() {
        let args = CliArgs::try_parse_from(["tellmemo-export", "s.json"]).unwrap();
        assert_eq!(args.input, PathBuf::from("s.json"));
        assert_eq!(args.format.formats(), ExportFormat::ALL.to_vec());
        assert_eq!(args.out_dir, PathBuf::from("."));
    }

    #[test]
    fn format_aliases_and_validation() {
        let args = CliArgs::try_parse_from(["tellmemo-export", "s.json", "md", "/tmp/out"]).unwrap();
        assert_eq!(args.format, FormatArg::Markdown);
        assert_eq!(args.out_dir, PathBuf::from("/tmp/out"));

        let err = CliArgs::try_parse_from(["tellmemo-export", "s.json", "xlsx"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(CliArgs::try_parse_from(["tellmemo-export"]).is_err());
    }
}
