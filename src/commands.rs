use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use dialoguer::Confirm;

use fundlink::dashboard::{
    AdminDashboard, AssociationDashboard, EntrepreneurDashboard, InvestorDashboard, Navigation,
    ProfileView, ViewScope,
};
use fundlink::guard::{GuardOutcome, LOGIN_ROUTE, home_route};
use fundlink::types::{
    Amount, AnnouncementDraft, Attachment, CollaborationType, EventDraft, EventPatch, NewProject,
    NewUser, Profile, ProposalTerms, PublicationStatus, RecordId, Role, RoleProfile, UserPatch,
};
use fundlink::validation::HelpRequestDraft;
use fundlink::{
    ApiClient, FileBackend, RouteGuard, ServiceError, ServiceResult, Session, SessionStore,
    create_api_client,
};

use crate::cli::{
    AnnouncementCommand, Command, ContractCommand, EventCommand, EventFields, HelpRequestCommand,
    LoginArgs, ProfileArgs, ProfileCommand, ProjectCommand, ProposalCommand, Settings,
    UserCommand,
};
use crate::render;

/// Wires the session file, API client and route guard together for one
/// command invocation.
pub struct App {
    settings: Settings,
    session: Arc<SessionStore>,
    client: ApiClient,
    guard: RouteGuard,
}

impl App {
    pub fn new(settings: Settings) -> ServiceResult<Self> {
        let path = match &settings.session_file {
            Some(path) => path.clone(),
            None => FileBackend::default_path()?,
        };
        tracing::debug!(path = %path.display(), "using session file");
        let session = Arc::new(SessionStore::open(Box::new(FileBackend::new(path))));
        let client = create_api_client(&settings.api_url, session.clone());
        let guard = RouteGuard::new(session.clone());
        Ok(Self {
            settings,
            session,
            client,
            guard,
        })
    }

    fn scope(&self) -> ViewScope {
        ViewScope::new(self.client.clone())
    }

    /// Runs the guard for `route`. Returns false (after telling the user where
    /// they were sent) when the view must not render.
    fn enter(&self, route: &str) -> bool {
        let outcome = self.guard.check_path(route);
        report_outcome(route, outcome)
    }

    /// Guard for views open to any logged-in role.
    fn enter_authenticated(&self, route: &str) -> bool {
        let outcome = self.guard.check(None);
        report_outcome(route, outcome)
    }

    fn current(&self) -> ServiceResult<Session> {
        self.session
            .session()
            .ok_or_else(|| ServiceError::Other("Not logged in".to_string()))
    }

    fn role_route(&self, suffix: &str, fallback: Role) -> String {
        let role = self.session.role().unwrap_or(fallback);
        let base = home_route(role)
            .rsplit_once('/')
            .map(|(base, _)| base)
            .unwrap_or_default();
        format!("{base}/{suffix}")
    }

    fn confirm(&self, prompt: &str) -> ServiceResult<bool> {
        if self.settings.yes {
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ServiceError::Other(format!("confirmation failed: {e}")))
    }

    pub async fn run(&self, command: Command) -> ServiceResult<()> {
        match command {
            Command::Login(args) => self.login(args),
            Command::Logout => {
                self.session.clear()?;
                render::success("Logged out");
                Ok(())
            }
            Command::Whoami => self.whoami(),
            Command::Open { route } => self.open(&route).await,
            Command::Dashboard => {
                let session = self.current();
                match session {
                    Ok(session) => self.open(home_route(session.role)).await,
                    Err(_) => self.open(LOGIN_ROUTE).await,
                }
            }
            Command::Users(cmd) => self.users(cmd).await,
            Command::Projects(cmd) => self.projects(cmd).await,
            Command::HelpRequests(cmd) => self.help_requests(cmd).await,
            Command::Proposals(cmd) => self.proposals(cmd).await,
            Command::Collaborations => self.collaborations().await,
            Command::Contracts(cmd) => self.contracts(cmd).await,
            Command::Events(cmd) => self.events(cmd).await,
            Command::Announcements(cmd) => self.announcements(cmd).await,
            Command::Profile(cmd) => self.profile(cmd).await,
            Command::Version => {
                println!(
                    "{} {}",
                    fundlink::metadata::PKG_NAME,
                    fundlink::metadata::PKG_VERSION
                );
                Ok(())
            }
        }
    }

    fn login(&self, args: LoginArgs) -> ServiceResult<()> {
        let mut session = Session::new(args.token, args.role, RecordId::from(args.user_id));
        if let Some(refresh) = args.refresh_token {
            session = session.with_refresh_token(refresh);
        }
        let role = session.role;
        self.session.set_session(session)?;
        render::success(&format!(
            "Logged in as {}, home is {}",
            role,
            home_route(role).bold()
        ));
        Ok(())
    }

    fn whoami(&self) -> ServiceResult<()> {
        match self.session.session() {
            Some(session) => {
                println!("role     {}", session.role.to_string().bold());
                println!("user id  {}", session.user_id);
                println!("home     {}", home_route(session.role));
            }
            None => println!("{}", "Not logged in".dimmed()),
        }
        Ok(())
    }

    /// Navigates to a client route: the guard decides, and dashboard routes
    /// mount and render their view.
    async fn open(&self, route: &str) -> ServiceResult<()> {
        if route == LOGIN_ROUTE {
            println!(
                "Log in with `{} login --token ... --role ... --user-id ...`",
                fundlink::metadata::PKG_NAME
            );
            return Ok(());
        }
        if !self.enter(route) {
            return Ok(());
        }
        let nav = match route {
            AdminDashboard::ROUTE => {
                let mut view = AdminDashboard::new(self.scope());
                let nav = view.mount().await;
                render::admin_dashboard(&view);
                nav
            }
            EntrepreneurDashboard::ROUTE => {
                let mut view = EntrepreneurDashboard::new(self.scope());
                let nav = view.mount().await;
                render::entrepreneur_dashboard(&view);
                nav
            }
            InvestorDashboard::ROUTE => {
                let mut view = InvestorDashboard::new(self.scope());
                let nav = view.mount().await;
                render::investor_dashboard(&view);
                nav
            }
            AssociationDashboard::ROUTE => {
                let mut view = AssociationDashboard::new(self.scope());
                let nav = view.mount().await;
                render::association_dashboard(&view);
                nav
            }
            _ => {
                render::success(&format!("{route} is open to you"));
                Navigation::Stay
            }
        };
        follow(nav)
    }

    async fn users(&self, cmd: UserCommand) -> ServiceResult<()> {
        if !self.enter("/admin/users") {
            return Ok(());
        }
        let mut view = AdminDashboard::new(self.scope());
        match cmd {
            UserCommand::List => {
                let nav = view.mount().await;
                render::section("Statistics", &view.stats, render::stats);
                render::section("Users", &view.users, |list| render::users(list));
                follow(nav)
            }
            UserCommand::Create {
                username,
                email,
                password,
                role,
            } => {
                let user = view
                    .create_user(NewUser {
                        username,
                        email,
                        password,
                        role,
                    })
                    .await?;
                render::success("User created");
                render::user(&user);
                Ok(())
            }
            UserCommand::Update {
                id,
                username,
                email,
                role,
                active,
            } => {
                let patch = UserPatch {
                    username,
                    email,
                    role,
                    is_active: active,
                };
                let user = view.update_user(RecordId::from(id), patch).await?;
                render::success("User updated");
                render::user(&user);
                Ok(())
            }
            UserCommand::Delete { id } => {
                if !self.confirm(&format!("Delete user {id}?"))? {
                    return Ok(());
                }
                view.delete_user(RecordId::from(id)).await?;
                render::success("User deleted");
                Ok(())
            }
        }
    }

    async fn projects(&self, cmd: ProjectCommand) -> ServiceResult<()> {
        match cmd {
            ProjectCommand::List => {
                if !self.enter(&self.role_route("projects", Role::Entrepreneur)) {
                    return Ok(());
                }
                let projects = self.scope().fetch(|c| c.list_projects()).await?;
                render::heading("Projects");
                render::projects(&projects);
                Ok(())
            }
            ProjectCommand::Create {
                name,
                description,
                sector,
                funding_goal,
            } => {
                if !self.enter("/entrepreneur/projects") {
                    return Ok(());
                }
                let mut view = EntrepreneurDashboard::new(self.scope());
                let project = view
                    .create_project(NewProject {
                        name,
                        description,
                        sector,
                        funding_goal,
                    })
                    .await?;
                render::success("Project submitted for review");
                render::project(&project);
                Ok(())
            }
            ProjectCommand::Upload { id, file } => {
                if !self.enter("/entrepreneur/projects") {
                    return Ok(());
                }
                let document = read_attachment(&file)?;
                let mut view = EntrepreneurDashboard::new(self.scope());
                let project = view.upload_document(RecordId::from(id), document).await?;
                render::success("Document uploaded");
                render::project(&project);
                Ok(())
            }
            ProjectCommand::Decide { id, decision } => {
                if !self.enter("/admin/projects") {
                    return Ok(());
                }
                let mut view = AdminDashboard::new(self.scope());
                follow(view.mount().await)?;
                let project = view
                    .decide_project(RecordId::from(id), decision.project_status())
                    .await?;
                render::success(&format!("Project {}", project.status.as_str()));
                render::project(&project);
                Ok(())
            }
        }
    }

    async fn help_requests(&self, cmd: HelpRequestCommand) -> ServiceResult<()> {
        match cmd {
            HelpRequestCommand::Show { id } => {
                if !self.enter(&self.role_route("help-requests", Role::Investor)) {
                    return Ok(());
                }
                let id = RecordId::from(id);
                let request = self.scope().fetch(move |c| c.get_help_request(&id)).await?;
                render::heading("Help request");
                render::help_request(&request);
                Ok(())
            }
            HelpRequestCommand::Create {
                project,
                kind,
                description,
                amount,
                expertise,
            } => {
                if !self.enter("/entrepreneur/help-requests") {
                    return Ok(());
                }
                let draft = HelpRequestDraft {
                    project: Some(RecordId::from(project)),
                    request_type: Some(kind),
                    description,
                    amount_requested: amount.as_deref().map(Amount::from),
                    expertise_needed: expertise,
                };
                let view = EntrepreneurDashboard::new(self.scope());
                let request = view.create_help_request(draft).await?;
                render::success("Help request sent");
                render::help_request(&request);
                Ok(())
            }
        }
    }

    async fn proposals(&self, cmd: ProposalCommand) -> ServiceResult<()> {
        match cmd {
            ProposalCommand::List => {
                if !self.enter(&self.role_route("proposals", Role::Investor)) {
                    return Ok(());
                }
                let scope = self.scope();
                let (financial, technical) = tokio::join!(
                    scope.fetch(|c| c.list_proposals(CollaborationType::Financial)),
                    scope.fetch(|c| c.list_proposals(CollaborationType::Technical)),
                );
                render::heading("Financial proposals");
                show_or_fail(financial, |list| render::proposals(list))?;
                render::heading("Technical proposals");
                show_or_fail(technical, |list| render::proposals(list))?;
                Ok(())
            }
            ProposalCommand::Financial {
                help_request,
                amount,
                payment_schedule,
                expected_return,
            } => {
                let terms = ProposalTerms::Financial {
                    investment_amount: Amount::from(amount.as_str()),
                    payment_schedule,
                    expected_return,
                };
                self.submit_proposal(help_request, terms).await
            }
            ProposalCommand::Technical {
                help_request,
                expertise,
                support_duration,
                approach,
            } => {
                let terms = ProposalTerms::Technical {
                    expertise,
                    support_duration,
                    proposed_approach: approach,
                };
                self.submit_proposal(help_request, terms).await
            }
            ProposalCommand::Respond { kind, id, answer } => {
                if !self.enter("/entrepreneur/proposals") {
                    return Ok(());
                }
                let mut view = EntrepreneurDashboard::new(self.scope());
                follow(view.mount().await)?;
                let proposal = view
                    .respond(kind, RecordId::from(id), answer.status())
                    .await?;
                render::success(&format!("Proposal {}", proposal.status.as_str()));
                render::proposal(&proposal);
                Ok(())
            }
            ProposalCommand::Withdraw { kind, id } => {
                if !self.enter("/investors/proposals") {
                    return Ok(());
                }
                if !self.confirm(&format!("Withdraw {kind} proposal {id}?"))? {
                    return Ok(());
                }
                let mut view = InvestorDashboard::new(self.scope());
                view.withdraw_proposal(kind, RecordId::from(id)).await?;
                render::success("Proposal withdrawn");
                Ok(())
            }
        }
    }

    async fn submit_proposal(&self, help_request: String, terms: ProposalTerms) -> ServiceResult<()> {
        if !self.enter("/investors/proposals") {
            return Ok(());
        }
        let mut view = InvestorDashboard::new(self.scope());
        let proposal = view
            .submit_proposal(RecordId::from(help_request), terms)
            .await?;
        render::success("Proposal sent");
        render::proposal(&proposal);
        Ok(())
    }

    async fn collaborations(&self) -> ServiceResult<()> {
        if !self.enter("/investors/collaborations") {
            return Ok(());
        }
        let mut view = InvestorDashboard::new(self.scope());
        let nav = view.reload_collaborations().await;
        render::section("Collaborations", &view.collaborations, render::groups);
        follow(nav)
    }

    async fn contracts(&self, cmd: ContractCommand) -> ServiceResult<()> {
        if !self.enter("/investors/contracts") {
            return Ok(());
        }
        match cmd {
            ContractCommand::List => {
                let contracts = self.scope().fetch(|c| c.list_contracts()).await?;
                render::heading("Contracts");
                render::contracts(&contracts);
                Ok(())
            }
            ContractCommand::Download { id, out, view } => {
                let dashboard = InvestorDashboard::new(self.scope());
                let blob = dashboard.contract_document(RecordId::from(id), !view).await?;
                std::fs::write(&out, &blob.bytes)?;
                render::success(&format!(
                    "Saved {} ({} bytes, {})",
                    out.display(),
                    blob.bytes.len(),
                    blob.content_type
                ));
                Ok(())
            }
        }
    }

    async fn events(&self, cmd: EventCommand) -> ServiceResult<()> {
        if !self.enter("/association/events") {
            return Ok(());
        }
        let mut view = AssociationDashboard::new(self.scope());
        match cmd {
            EventCommand::List => {
                let nav = view.mount().await;
                render::section("Events", &view.events, |list| render::events(list));
                follow(nav)
            }
            EventCommand::Create { fields, publish } => {
                let status = if publish {
                    PublicationStatus::Published
                } else {
                    PublicationStatus::Draft
                };
                let draft = EventDraft {
                    title: fields.title.unwrap_or_default(),
                    description: fields.description.unwrap_or_default(),
                    location: fields.location.unwrap_or_default(),
                    start_date: fields.start_date.unwrap_or_default(),
                    end_date: fields.end_date,
                    status,
                };
                let event = view.create_event(draft).await?;
                render::success("Event created");
                render::event(&event);
                Ok(())
            }
            EventCommand::Update { id, fields } => {
                follow(view.mount().await)?;
                let event = view.patch_event(RecordId::from(id), event_patch(fields)).await?;
                render::success("Event updated");
                render::event(&event);
                Ok(())
            }
            EventCommand::Replace { id, fields } => {
                follow(view.mount().await)?;
                let id = RecordId::from(id);
                let current = view
                    .events
                    .require("Events")?
                    .iter()
                    .find(|e| e.id == id)
                    .map(EventDraft::from)
                    .ok_or_else(|| ServiceError::Other(format!("Event {id} is not in the list")))?;
                let event = view.replace_event(id, merge_event(current, fields)).await?;
                render::success("Event replaced");
                render::event(&event);
                Ok(())
            }
            EventCommand::Publish { id } => {
                follow(view.mount().await)?;
                let event = view.publish_event(RecordId::from(id)).await?;
                render::success("Event published");
                render::event(&event);
                Ok(())
            }
            EventCommand::Delete { id } => {
                if !self.confirm(&format!("Delete event {id}?"))? {
                    return Ok(());
                }
                view.delete_event(RecordId::from(id)).await?;
                render::success("Event deleted");
                Ok(())
            }
        }
    }

    async fn announcements(&self, cmd: AnnouncementCommand) -> ServiceResult<()> {
        if !self.enter("/association/announcements") {
            return Ok(());
        }
        let mut view = AssociationDashboard::new(self.scope());
        match cmd {
            AnnouncementCommand::List => {
                let nav = view.mount().await;
                render::section("Announcements", &view.announcements, |list| {
                    render::announcements(list)
                });
                follow(nav)
            }
            AnnouncementCommand::Create {
                title,
                content,
                image,
                publish,
            } => {
                let image = image.as_deref().map(read_attachment).transpose()?;
                let draft = AnnouncementDraft {
                    title,
                    content,
                    status: if publish {
                        PublicationStatus::Published
                    } else {
                        PublicationStatus::Draft
                    },
                    image,
                };
                let announcement = view.create_announcement(draft).await?;
                render::success("Announcement created");
                render::announcement(&announcement);
                Ok(())
            }
        }
    }

    async fn profile(&self, cmd: ProfileCommand) -> ServiceResult<()> {
        if !self.enter_authenticated("/profile") {
            return Ok(());
        }
        let session = self.current()?;
        let mut view = ProfileView::new(self.scope(), session.user_id.clone(), session.role);
        let nav = view.mount().await;
        match cmd {
            ProfileCommand::Show => {
                render::profile_view(&view);
                follow(nav)
            }
            ProfileCommand::Save(args) => {
                follow(nav)?;
                if let Some(error) = &view.profile.error {
                    return Err(ServiceError::Other(error.clone()));
                }
                let saved = view.save(profile_from_args(session.role, args)).await?;
                render::success("Profile saved");
                render::profile(&saved);
                Ok(())
            }
            ProfileCommand::Delete => {
                follow(nav)?;
                if !self.confirm("Delete your profile?")? {
                    return Ok(());
                }
                view.delete().await?;
                render::success("Profile deleted");
                Ok(())
            }
        }
    }
}

fn report_outcome(route: &str, outcome: GuardOutcome) -> bool {
    match outcome {
        GuardOutcome::Render => true,
        GuardOutcome::RedirectLogin => {
            render::failure(&format!("{route} requires a login"));
            println!("→ {LOGIN_ROUTE}");
            false
        }
        GuardOutcome::RedirectUnauthorized => {
            render::failure(&format!("Your role cannot open {route}"));
            if let Some(target) = outcome.redirect_target() {
                println!("→ {target}");
            }
            false
        }
    }
}

/// Maps a dashboard navigation signal onto the command result.
fn follow(nav: Navigation) -> ServiceResult<()> {
    match nav {
        Navigation::Stay => Ok(()),
        Navigation::Login => Err(ServiceError::AuthExpired { status: 401 }),
    }
}

/// Renders a standalone fetch; auth expiry still aborts the command.
fn show_or_fail<T>(result: ServiceResult<T>, show: impl FnOnce(&T)) -> ServiceResult<()> {
    match result {
        Ok(data) => {
            show(&data);
            Ok(())
        }
        Err(e) if e.is_auth_expired() => Err(e),
        Err(e) => {
            render::failure(&e.user_message());
            Ok(())
        }
    }
}

fn event_patch(fields: EventFields) -> EventPatch {
    EventPatch {
        title: fields.title,
        description: fields.description,
        location: fields.location,
        start_date: fields.start_date,
        end_date: fields.end_date,
        status: None,
    }
}

fn merge_event(mut draft: EventDraft, fields: EventFields) -> EventDraft {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(description) = fields.description {
        draft.description = description;
    }
    if let Some(location) = fields.location {
        draft.location = location;
    }
    if let Some(start_date) = fields.start_date {
        draft.start_date = start_date;
    }
    if fields.end_date.is_some() {
        draft.end_date = fields.end_date;
    }
    draft
}

fn profile_from_args(role: Role, args: ProfileArgs) -> Profile {
    let details = match role {
        Role::Entrepreneur => RoleProfile::Entrepreneur {
            company_name: args.company_name.unwrap_or_default(),
            sector: args.sector.unwrap_or_default(),
        },
        Role::Investor => RoleProfile::Investor {
            investment_capacity: Amount::from(args.investment_capacity.as_deref().unwrap_or("")),
            preferred_sectors: args.preferred_sectors,
        },
        Role::Association => RoleProfile::Association {
            organization_name: args.organization_name.unwrap_or_default(),
            mission: args.mission.unwrap_or_default(),
        },
        Role::Admin => RoleProfile::Admin {},
    };
    Profile {
        first_name: args.first_name,
        last_name: args.last_name,
        phone: args.phone,
        bio: args.bio,
        details,
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn read_attachment(path: &Path) -> ServiceResult<Attachment> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(Attachment {
        file_name,
        content_type: content_type_for(path).to_string(),
        bytes,
    })
}

/// Prints a failed command. Returns true when the user has to log in again.
pub fn report_error(err: &ServiceError) -> bool {
    match err {
        ServiceError::AuthExpired { .. } => {
            render::failure("Session expired, please log in again");
            println!("→ {LOGIN_ROUTE}");
            true
        }
        ServiceError::Validation(errors) => {
            render::validation(errors);
            false
        }
        other => {
            render::failure(&other.user_message());
            false
        }
    }
}
