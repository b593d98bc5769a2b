// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `generate` and `inspect`, and
// their flags.
//
// Period flags:
//   --month 3               → current year, March
//   --year 2025 --month 3   → March 2025
//   --year 2025             → rejected (needs --month)
//   (neither)               → dates in the template stay as they are

use clap::{Args, Subcommand};
use crate::application::generate_use_case::GenerateConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one approval document per office in the workbook
    Generate(GenerateArgs),

    /// Show the template's blocks and the region that gets replaced
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Budget workbook, one sheet per office
    #[arg(long, default_value = "data/办事处日常费用预算财务.xlsx")]
    pub workbook: String,

    /// Approval template (.docx)
    #[arg(long, default_value = "data/日常费用预算财务.docx")]
    pub template: String,

    /// Where the generated documents and report.json are written
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Target year, defaults to the current year when --month is given
    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    /// Target month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Template profile JSON (see `inspect --write-profile`)
    #[arg(long)]
    pub profile: Option<String>,

    /// Keep the template's dates; the month still selects the cutoff day
    #[arg(long)]
    pub no_date: bool,
}

impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        GenerateConfig {
            workbook:         a.workbook,
            template:         a.template,
            output_dir:       a.output_dir,
            year:             a.year,
            month:            a.month,
            profile:          a.profile,
            substitute_dates: !a.no_date,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Template to inspect (.docx)
    #[arg(long, default_value = "data/日常费用预算财务.docx")]
    pub template: String,

    /// Template profile JSON to locate the region with
    #[arg(long)]
    pub profile: Option<String>,

    /// Save the profile in effect to this path
    #[arg(long)]
    pub write_profile: Option<String>,
}
