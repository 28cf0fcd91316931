use colored::Colorize;

use fundlink::aggregate::CollaborationGroups;
use fundlink::dashboard::{
    AdminDashboard, AssociationDashboard, EntrepreneurDashboard, InvestorDashboard, Loadable,
    ProfileView,
};
use fundlink::types::{
    Amount, Announcement, CollaborationType, Contract, Event, HelpRequest, Profile, Project,
    ProjectStatus, Proposal, ProposalStatus, ProposalTerms, PublicationStatus, RoleProfile, User,
    UserStats,
};
use fundlink::validation::ValidationErrors;

pub fn heading(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Renders a load: spinner text while loading, the error with a retry hint,
/// or the data through `show`.
pub fn section<T>(title: &str, state: &Loadable<T>, show: impl FnOnce(&T)) {
    heading(title);
    if let Some(error) = &state.error {
        println!("  {} {}", "error:".red().bold(), error);
        println!("  {}", "Retry: run the same command again.".dimmed());
    } else if let Some(data) = &state.data {
        show(data);
    } else if state.loading {
        println!("  {}", "loading…".dimmed());
    } else {
        println!("  {}", "not loaded".dimmed());
    }
}

fn empty(items: usize) -> bool {
    if items == 0 {
        println!("  {}", "(none)".dimmed());
        return true;
    }
    false
}

pub fn amount(value: &Option<Amount>) -> String {
    match value {
        None => "-".to_string(),
        Some(a) => match a.parse() {
            Some(v) => format!("{v:.2}"),
            None => format!("{a:?}"),
        },
    }
}

fn project_status(status: ProjectStatus) -> colored::ColoredString {
    match status {
        ProjectStatus::Pending => status.as_str().yellow(),
        ProjectStatus::Approved => status.as_str().green(),
        ProjectStatus::Rejected => status.as_str().red(),
    }
}

fn proposal_status(status: ProposalStatus) -> colored::ColoredString {
    match status {
        ProposalStatus::Pending => status.as_str().yellow(),
        ProposalStatus::Accepted => status.as_str().green(),
        ProposalStatus::Refused => status.as_str().red(),
    }
}

fn publication(status: PublicationStatus) -> colored::ColoredString {
    match status {
        PublicationStatus::Draft => status.as_str().yellow(),
        PublicationStatus::Published => status.as_str().green(),
    }
}

pub fn user(u: &User) {
    let active = if u.is_active { "active".green() } else { "inactive".red() };
    println!(
        "  #{:<5} {:<20} {:<30} {:<16} {}",
        u.id.to_string(),
        u.username,
        u.email,
        u.role.to_string(),
        active
    );
}

pub fn users(list: &[User]) {
    if empty(list.len()) {
        return;
    }
    list.iter().for_each(user);
}

pub fn stats(s: &UserStats) {
    println!(
        "  total {}  entrepreneurs {}  investors {}  associations {}  admins {}  active {}",
        s.total.to_string().bold(),
        s.entrepreneurs,
        s.investors,
        s.associations,
        s.admins,
        s.active
    );
}

pub fn project(p: &Project) {
    println!(
        "  #{:<5} {:<30} {:<10} goal {}{}",
        p.id.to_string(),
        p.name,
        project_status(p.status),
        amount(&p.funding_goal),
        p.document
            .as_ref()
            .map(|d| format!("  doc {d}"))
            .unwrap_or_default()
    );
}

pub fn projects(list: &[Project]) {
    if empty(list.len()) {
        return;
    }
    list.iter().for_each(project);
}

pub fn proposal(p: &Proposal) {
    let terms = match &p.terms {
        ProposalTerms::Financial {
            investment_amount,
            payment_schedule,
            expected_return,
        } => format!(
            "{} {} / {} / return {}",
            "financial".cyan(),
            amount(&Some(investment_amount.clone())),
            payment_schedule,
            expected_return
        ),
        ProposalTerms::Technical {
            expertise,
            support_duration,
            proposed_approach,
        } => format!(
            "{} {} for {} ({})",
            "technical".magenta(),
            expertise,
            support_duration,
            proposed_approach
        ),
    };
    println!(
        "  #{:<5} request #{:<5} {:<9} {}",
        p.id.to_string(),
        p.help_request.to_string(),
        proposal_status(p.status),
        terms
    );
}

pub fn proposals(list: &[Proposal]) {
    if empty(list.len()) {
        return;
    }
    list.iter().for_each(proposal);
}

pub fn help_request(h: &HelpRequest) {
    println!(
        "  #{} project #{} {} {}",
        h.id,
        h.project,
        h.request_type.to_string().cyan(),
        h.status.as_deref().unwrap_or("")
    );
    println!("    {}", h.description);
    match h.request_type {
        CollaborationType::Financial => println!("    amount requested {}", amount(&h.amount_requested)),
        CollaborationType::Technical => println!(
            "    expertise needed {}",
            h.expertise_needed.as_deref().unwrap_or("-")
        ),
    }
}

pub fn groups(groups: &CollaborationGroups) {
    if empty(groups.len()) {
        return;
    }
    for g in groups {
        println!(
            "  {} <{}> {}",
            g.entrepreneur.name.bold(),
            g.entrepreneur.email,
            g.entrepreneur.phone.as_deref().unwrap_or("")
        );
        println!(
            "    {} collaborations ({} financial, {} technical), projects: {}",
            g.collaborations.len(),
            g.count_of(CollaborationType::Financial),
            g.count_of(CollaborationType::Technical),
            g.projects.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        println!(
            "    contracts: {}  invested: {}",
            g.contracts.len(),
            format!("{:.2}", g.total_investment).green()
        );
        if g.malformed_amounts > 0 {
            println!(
                "    {}",
                format!("{} amount(s) could not be read and were left out", g.malformed_amounts)
                    .yellow()
            );
        }
    }
    println!(
        "  {} {}",
        "total invested:".bold(),
        format!("{:.2}", groups.total_investment()).green().bold()
    );
}

pub fn contracts(list: &[Contract]) {
    if empty(list.len()) {
        return;
    }
    for c in list {
        println!(
            "  #{:<5} amount {:<12} {} {}",
            c.id.to_string(),
            amount(&c.investment_amount),
            c.status.as_deref().unwrap_or(""),
            c.created_at.as_deref().unwrap_or("")
        );
    }
}

pub fn event(e: &Event) {
    println!(
        "  #{:<5} {:<28} {:<10} {} → {}  @ {}",
        e.id.to_string(),
        e.title,
        publication(e.status),
        e.start_date,
        e.end_date.as_deref().unwrap_or("…"),
        e.location
    );
}

pub fn events(list: &[Event]) {
    if empty(list.len()) {
        return;
    }
    list.iter().for_each(event);
}

pub fn announcement(a: &Announcement) {
    println!(
        "  #{:<5} {:<30} {:<10} {}",
        a.id.to_string(),
        a.title,
        publication(a.status),
        a.image.as_deref().unwrap_or("")
    );
}

pub fn announcements(list: &[Announcement]) {
    if empty(list.len()) {
        return;
    }
    list.iter().for_each(announcement);
}

pub fn profile(p: &Profile) {
    println!("  {} {}", p.first_name.bold(), p.last_name.bold());
    if let Some(phone) = &p.phone {
        println!("  phone {phone}");
    }
    if let Some(bio) = &p.bio {
        println!("  {bio}");
    }
    match &p.details {
        RoleProfile::Entrepreneur {
            company_name,
            sector,
        } => println!("  {company_name} ({sector})"),
        RoleProfile::Investor {
            investment_capacity,
            preferred_sectors,
        } => println!(
            "  capacity {}  sectors {}",
            amount(&Some(investment_capacity.clone())),
            preferred_sectors.join(", ")
        ),
        RoleProfile::Association {
            organization_name,
            mission,
        } => println!("  {organization_name}: {mission}"),
        RoleProfile::Admin {} => {}
    }
}

pub fn admin_dashboard(d: &AdminDashboard) {
    section("Statistics", &d.stats, stats);
    section("Users", &d.users, |list| users(list));
    section("Projects", &d.projects, |list| projects(list));
}

pub fn entrepreneur_dashboard(d: &EntrepreneurDashboard) {
    section("My projects", &d.projects, |list| projects(list));
    section("Financial proposals", &d.financial_proposals, |list| proposals(list));
    section("Technical proposals", &d.technical_proposals, |list| proposals(list));
}

pub fn investor_dashboard(d: &InvestorDashboard) {
    section("Collaborations", &d.collaborations, groups);
    section("Contracts", &d.contracts, |list| contracts(list));
    section("My financial proposals", &d.financial_proposals, |list| proposals(list));
    section("My technical proposals", &d.technical_proposals, |list| proposals(list));
}

pub fn association_dashboard(d: &AssociationDashboard) {
    section("Events", &d.events, |list| events(list));
    section("Announcements", &d.announcements, |list| announcements(list));
}

pub fn profile_view(v: &ProfileView) {
    section("Profile", &v.profile, |p| match p {
        Some(p) => profile(p),
        None => println!("  {}", "No profile yet. Create one with `profile save`.".dimmed()),
    });
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

pub fn validation(errors: &ValidationErrors) {
    eprintln!("{}", "Please fix the following fields:".red().bold());
    for e in &errors.errors {
        eprintln!("  {} {}", format!("{}:", e.field).yellow(), e.message);
    }
}
