use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fundlink::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use fundlink::types::{CollaborationType, ProjectStatus, ProposalStatus, Role};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Backend base URL
    #[arg(long, global = true, env = "FUNDLINK_API_URL", default_value = "http://localhost:8000/api")]
    pub api_url: String,

    /// Session file (defaults to ~/.fundlink/session.json)
    #[arg(long, global = true, env = "FUNDLINK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true, default_value_t = false)]
    pub yes: bool,
}

impl Settings {
    /// Validate CLI/environment-derived arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.trim().is_empty() {
            return Err("FUNDLINK_API_URL cannot be empty".to_string());
        }
        if self.api_url.contains(char::is_whitespace) {
            return Err(format!("Invalid FUNDLINK_API_URL '{}'", self.api_url));
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Store the token issued by the authentication service
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Open a client route (e.g. /admin/dashboard) through the route guard
    Open {
        route: String,
    },
    /// Open the dashboard of the logged-in role
    Dashboard,
    /// Manage users (admin)
    #[command(subcommand)]
    Users(UserCommand),
    /// Manage projects
    #[command(subcommand)]
    Projects(ProjectCommand),
    /// Help requests
    #[command(subcommand)]
    HelpRequests(HelpRequestCommand),
    /// Proposals
    #[command(subcommand)]
    Proposals(ProposalCommand),
    /// Collaborations grouped by entrepreneur (investor)
    Collaborations,
    /// Contracts (investor)
    #[command(subcommand)]
    Contracts(ContractCommand),
    /// Events (association)
    #[command(subcommand)]
    Events(EventCommand),
    /// Announcements (association)
    #[command(subcommand)]
    Announcements(AnnouncementCommand),
    /// Your profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long, env = "FUNDLINK_TOKEN")]
    pub token: String,
    #[arg(long)]
    pub refresh_token: Option<String>,
    #[arg(long, value_parser = parse_role)]
    pub role: Role,
    #[arg(long)]
    pub user_id: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    List,
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FUNDLINK_NEW_USER_PASSWORD")]
        password: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },
    Update {
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn project_status(self) -> ProjectStatus {
        match self {
            Decision::Approve => ProjectStatus::Approved,
            Decision::Reject => ProjectStatus::Rejected,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        funding_goal: Option<f64>,
    },
    /// Attach a document (business plan, ...) to a project
    Upload {
        id: String,
        file: PathBuf,
    },
    /// Approve or reject a pending project (admin)
    Decide {
        id: String,
        #[arg(value_enum)]
        decision: Decision,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum HelpRequestCommand {
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        project: String,
        #[arg(long, value_parser = parse_kind)]
        kind: CollaborationType,
        #[arg(long)]
        description: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        expertise: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Answer {
    Accept,
    Refuse,
}

impl Answer {
    pub fn status(self) -> ProposalStatus {
        match self {
            Answer::Accept => ProposalStatus::Accepted,
            Answer::Refuse => ProposalStatus::Refused,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProposalCommand {
    List,
    /// Offer funding against a help request (investor)
    Financial {
        #[arg(long)]
        help_request: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        payment_schedule: String,
        #[arg(long)]
        expected_return: String,
    },
    /// Offer expertise against a help request (investor)
    Technical {
        #[arg(long)]
        help_request: String,
        #[arg(long)]
        expertise: String,
        #[arg(long)]
        support_duration: String,
        #[arg(long)]
        approach: String,
    },
    /// Accept or refuse a received proposal (entrepreneur)
    Respond {
        #[arg(value_parser = parse_kind)]
        kind: CollaborationType,
        id: String,
        #[arg(value_enum)]
        answer: Answer,
    },
    /// Withdraw one of your proposals (investor)
    Withdraw {
        #[arg(value_parser = parse_kind)]
        kind: CollaborationType,
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ContractCommand {
    List,
    /// Save a contract PDF to disk
    Download {
        id: String,
        #[arg(long, short = 'o')]
        out: PathBuf,
        /// Fetch the inline view instead of the download rendition
        #[arg(long, default_value_t = false)]
        view: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EventFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub start_date: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum EventCommand {
    List,
    Create {
        #[command(flatten)]
        fields: EventFields,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
    /// Change some fields of an event
    Update {
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Replace the event, fields not given are kept from the current version
    Replace {
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    Publish {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnnouncementCommand {
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    Show,
    /// Create or update the profile; role fields follow the logged-in role
    Save(ProfileArgs),
    Delete,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    /// Entrepreneur: company name
    #[arg(long)]
    pub company_name: Option<String>,
    /// Entrepreneur: sector
    #[arg(long)]
    pub sector: Option<String>,
    /// Investor: investment capacity
    #[arg(long)]
    pub investment_capacity: Option<String>,
    /// Investor: preferred sectors
    #[arg(long, value_delimiter = ',')]
    pub preferred_sectors: Vec<String>,
    /// Association: organization name
    #[arg(long)]
    pub organization_name: Option<String>,
    /// Association: mission
    #[arg(long)]
    pub mission: Option<String>,
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}

fn parse_kind(s: &str) -> Result<CollaborationType, String> {
    s.parse()
}
