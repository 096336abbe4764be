pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use q2d_core::auth::Role;
use std::process::ExitCode;

use commands::add::NewItem;
use commands::stage::StageView;

#[derive(Debug, Parser)]
#[command(
    name = "q2d",
    about = "Q2D order tracker CLI",
    long_about = "Track furniture orders from quotation followup to payment collection: \
                  browse stage queues, submit stage forms, and inspect storage readiness.",
    after_help = "Examples:\n  q2d seed\n  \
                  q2d add --customer-name \"Kavya Rao\" --phone 9811122233 --location Pune\n  \
                  q2d stage followup --search amit\n  \
                  q2d update LEAD-ABC123XYZ followup --field status=order_received\n  \
                  q2d doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Add two demo items per stage when the saved state has no items")]
    Seed,
    #[command(about = "Show pending, completed, revenue, followup breakdown and recent activity")]
    Dashboard {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Add a new lead; it starts at quotation followup")]
    Add {
        #[arg(long)]
        customer_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        requirement: Option<String>,
        #[arg(long, value_name = "AMOUNT")]
        quotation_amount: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        expected_delivery_date: Option<String>,
    },
    #[command(about = "List the items queued at a stage, or those already handled there")]
    Stage {
        #[arg(help = "Stage identifier, e.g. followup or install-material")]
        stage: String,
        #[arg(long, default_value = "", help = "Case-insensitive customer name filter")]
        search: String,
        #[arg(long, help = "Show items already handled at this stage")]
        history: bool,
        #[arg(
            long,
            value_enum,
            default_value = "admin",
            help = "Role whose stage visibility applies"
        )]
        role: RoleArg,
    },
    #[command(about = "Submit a stage form for an item and advance it when the form says so")]
    Update {
        item_id: String,
        stage: String,
        #[arg(long = "field", value_name = "NAME=VALUE", help = "Form field value; repeatable")]
        fields: Vec<String>,
    },
    #[command(about = "Print the recent activity feed, newest first")]
    Activity,
    #[command(about = "Check credentials and print the resulting role and visible stages")]
    Login {
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity and saved state readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Dashboard { json } => commands::dashboard::run(json),
        Command::Add {
            customer_name,
            phone,
            location,
            requirement,
            quotation_amount,
            expected_delivery_date,
        } => commands::add::run(NewItem {
            customer_name,
            phone,
            site_location: location,
            requirement,
            quotation_amount,
            expected_delivery_date,
        }),
        Command::Stage { stage, search, history, role } => {
            let view = if history { StageView::History } else { StageView::Pending };
            commands::stage::run(&stage, &search, view, role.into())
        }
        Command::Update { item_id, stage, fields } => {
            commands::update::run(&item_id, &stage, &fields)
        }
        Command::Activity => commands::activity::run(),
        Command::Login { username, password } => commands::login::run(&username, &password),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
