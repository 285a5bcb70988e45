use clap::{Parser, Subcommand};
use clearwhistle::{OrganizationType, ReportType};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "clearwhistle")]
#[command(about = "Anonymous, verified organizational misconduct reporting")]
#[command(long_about = "ClearWhistle lets members of an organization report misconduct \
                       anonymously. Reporters prove membership with a one-time code sent to \
                       their organizational email; the report is stored by content and anchored \
                       in a tamper-evident ledger, and the email is never stored with it. \
                       Start with 'clearwhistle submit --help'.")]
pub struct Cli {
    /// Load configuration from this file instead of clearwhistle.toml
    #[arg(long, global = true, help = "Configuration file to load on top of the defaults")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify your organizational email and submit a report in one run
    Submit {
        /// Kind of organization: company, school, government, nonprofit
        #[arg(
            long = "org-type",
            help = "Organization type: company, school, government, nonprofit"
        )]
        org_type: OrganizationType,
        /// Organization name
        #[arg(long = "org-name", help = "Name of the organization being reported")]
        org_name: String,
        /// Organizational email used only for verification
        #[arg(long, help = "Your organizational email (verified, never stored)")]
        email: String,
        /// One-time verification code
        #[arg(long, help = "Verification code sent to your organizational email")]
        code: String,
        /// Category of misconduct
        #[arg(
            long = "report-type",
            help = "Report type: financial, harassment, safety, ethics, other"
        )]
        report_type: ReportType,
        /// Report title
        #[arg(long, help = "Short title for the report")]
        title: String,
        /// Report details
        #[arg(long, help = "Full description of what happened")]
        details: String,
        /// Optional evidence file
        #[arg(long, help = "File to attach as supporting evidence")]
        evidence: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long, help = "Print the submission record as JSON")]
        json: bool,
    },
    /// Check that a submitted report is stored intact and anchored
    Verify {
        /// Content identifier from a submission record
        content_id: String,
        /// Print the result as JSON
        #[arg(long, help = "Print the verification result as JSON")]
        json: bool,
    },
    /// Print a stored report
    Show {
        /// Content identifier from a submission record
        content_id: String,
        /// Print the stored payload as JSON
        #[arg(long, help = "Print the stored payload as JSON")]
        json: bool,
    },
    /// List anchored submissions and verify the ledger chain
    Ledger {
        /// Print entries as JSON
        #[arg(long, help = "Print ledger entries as JSON")]
        json: bool,
    },
}
