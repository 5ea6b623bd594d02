use crate::export::ExportFormat;
use crate::models::participant::Decision;
use crate::models::status::AppointmentStatus;
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line interface definition for rcoach
/// Appointment booking and QR presence-token sessions on SQLite
#[derive(Parser)]
#[command(
    name = "rcoach",
    version = env!("CARGO_PKG_VERSION"),
    about = "Book coaching appointments and run QR-code check-in sessions backed by SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Pretend the current time is this ("YYYY-MM-DD HH:MM")
    #[arg(global = true, long = "now", value_name = "DATETIME")]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DecisionArg {
    Accept,
    Refuse,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    Pending,
    Confirmed,
    Refused,
    Started,
    Completed,
    Cancelled,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Specify the editor to use (vim, nano, or custom path)")]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "appointment", help = "Only entries for this appointment id")]
        appointment: Option<i64>,
    },

    /// Request an appointment with one or more coaches
    Book {
        #[arg(long = "client", help = "Client identity requesting the session")]
        client: String,

        #[arg(
            long = "coach",
            required = true,
            help = "Invited coach identity (repeat for group sessions)"
        )]
        coaches: Vec<String>,

        #[arg(long = "at", value_name = "DATETIME", help = "Planned start (YYYY-MM-DD HH:MM)")]
        at: String,

        #[arg(long = "duration", default_value_t = 60, help = "Planned length in minutes")]
        duration: i64,

        #[arg(long = "location", help = "Where the session takes place")]
        location: Option<String>,
    },

    /// Accept or refuse a booking request as an invited coach
    Decide {
        id: i64,

        #[arg(long = "coach")]
        coach: String,

        #[arg(value_enum)]
        decision: DecisionArg,

        #[arg(long = "at", value_name = "DATETIME", help = "Move the session (accept only)")]
        at: Option<String>,

        #[arg(long = "duration", help = "Change the length in minutes (accept only)")]
        duration: Option<i64>,

        #[arg(long = "location", help = "Change the location (accept only)")]
        location: Option<String>,
    },

    /// Get (or reuse) the QR presence token for an appointment
    Token {
        id: i64,

        #[arg(long = "participant")]
        participant: String,
    },

    /// Start a session by presenting the scanned token
    Start {
        id: i64,

        #[arg(long = "coach")]
        coach: String,

        #[arg(long = "token", help = "Scanned or manually typed token")]
        token: String,
    },

    /// End a running session
    End {
        id: i64,

        #[arg(long = "coach")]
        coach: String,
    },

    /// Cancel an appointment
    Cancel {
        id: i64,

        #[arg(long = "by", help = "Participant cancelling the appointment")]
        by: String,
    },

    /// Complete every started session past its planned end
    Sweep,

    /// Show the session a coach is currently running
    Current {
        #[arg(long = "coach")]
        coach: String,
    },

    /// Show one appointment in detail
    Show { id: i64 },

    /// List appointments
    List {
        #[arg(long = "participant", conflicts_with = "coach")]
        participant: Option<String>,

        #[arg(long = "coach")]
        coach: Option<String>,

        #[arg(long = "status", value_enum)]
        status: Option<StatusArg>,
    },

    /// Rate a completed session
    Feedback {
        id: i64,

        #[arg(long = "from")]
        from: String,

        #[arg(long = "rating", help = "1 to 5")]
        rating: u8,

        #[arg(long = "comment")]
        comment: Option<String>,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Export appointment history
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long = "participant")]
        participant: Option<String>,

        #[arg(long = "status", value_enum)]
        status: Option<StatusArg>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}

impl From<StatusArg> for AppointmentStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Pending => AppointmentStatus::Pending,
            StatusArg::Confirmed => AppointmentStatus::Confirmed,
            StatusArg::Refused => AppointmentStatus::Refused,
            StatusArg::Started => AppointmentStatus::Started,
            StatusArg::Completed => AppointmentStatus::Completed,
            StatusArg::Cancelled => AppointmentStatus::Cancelled,
        }
    }
}

impl From<DecisionArg> for Decision {
    fn from(d: DecisionArg) -> Self {
        match d {
            DecisionArg::Accept => Decision::Accepted,
            DecisionArg::Refuse => Decision::Refused,
        }
    }
}
