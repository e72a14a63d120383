use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use crossterm::event::{self, Event};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    cache::{QueryCache, QueryData, QueryKey, Resource, Ticket},
    client::{Client, ClientError},
    config::AppConfig,
    dashboard::{DashboardState, Focus, FormField, Mutation, MutationKind, categories_for_form},
    error::{AppError, Result},
    login::{AuthRequest, LoginState},
    router::{DASHBOARD_PATH, Navigator, Route},
    session::Session,
    ui::{self, keymap::AppAction},
};
use api_types::period::Period;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub level: ToastLevel,
    pub message: String,
    expires_at: Instant,
}

impl ToastState {
    fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Results delivered back to the UI loop by spawned requests.
#[derive(Debug)]
pub enum AppEvent {
    Fetched {
        ticket: Ticket,
        result: std::result::Result<QueryData, String>,
    },
    Authenticated {
        register: bool,
        result: std::result::Result<String, String>,
    },
    Mutated {
        kind: MutationKind,
        period: Period,
        result: std::result::Result<(), String>,
    },
}

#[derive(Debug)]
pub struct AppState {
    pub route: Route,
    pub login: LoginState,
    pub dashboard: DashboardState,
    pub cache: QueryCache,
    pub toast: Option<ToastState>,
    pub api_url: String,
}

impl AppState {
    pub fn categories(&self) -> Vec<String> {
        categories_for_form(self.cache.categories())
    }
}

pub struct App {
    client: Client,
    session: Arc<Session>,
    navigator: Navigator,
    pub state: AppState,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &AppConfig, session: Arc<Session>) -> Result<Self> {
        let client = Client::new(&config.api_url, session.clone())?;
        Ok(Self::with_client(client, session, config.today(), &config.email))
    }

    pub fn with_client(
        client: Client,
        session: Arc<Session>,
        today: NaiveDate,
        email: &str,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let navigator = Navigator::new(session.is_authenticated());
        let state = AppState {
            route: navigator.current(),
            login: LoginState::new(email),
            dashboard: DashboardState::new(today),
            cache: QueryCache::new(),
            toast: None,
            api_url: client.base_url().to_string(),
        };

        Self {
            client,
            session,
            navigator,
            state,
            events_tx,
            events_rx,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(100);
        self.sync_queries();

        while !self.should_quit {
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_action(ui::keymap::map_key(key));
                }
            }

            while let Ok(app_event) = self.events_rx.try_recv() {
                self.handle_event(app_event);
            }
            self.expire_toast(Instant::now());
            self.sync_queries();
        }

        Ok(())
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Waits for the next result from a spawned request.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    /// Starts fetches for every dashboard query that is missing or stale.
    pub fn sync_queries(&mut self) {
        if self.state.route != Route::Dashboard || !self.session.is_authenticated() {
            return;
        }
        let period = self.state.dashboard.period;
        for key in [
            QueryKey::summary(period),
            QueryKey::transactions(period),
            QueryKey::categories(),
        ] {
            if self.state.cache.needs_fetch(key) {
                self.spawn_fetch(key);
            }
        }
    }

    pub fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }
        match self.state.route {
            Route::Login => self.handle_login_action(action),
            Route::Dashboard => {
                if self.state.dashboard.delete_confirm.is_some() {
                    self.handle_modal_action(action);
                } else if self.state.dashboard.focus == Focus::Form {
                    self.handle_form_action(action);
                } else {
                    self.handle_list_action(action);
                }
            }
        }
    }

    fn handle_login_action(&mut self, action: AppAction) {
        let login = &mut self.state.login;
        if login.pending {
            return;
        }
        match action {
            AppAction::Input(ch) => login.input(ch),
            AppAction::Backspace => login.backspace(),
            AppAction::NextField | AppAction::Down => login.next_field(),
            AppAction::PrevField | AppAction::Up => login.prev_field(),
            AppAction::ToggleMode => login.toggle_mode(),
            AppAction::Submit => match login.submit() {
                Ok(request) => self.spawn_auth(request),
                Err(err) => self.toast(ToastLevel::Error, err.to_string()),
            },
            _ => {}
        }
    }

    fn handle_modal_action(&mut self, action: AppAction) {
        match action {
            AppAction::Submit | AppAction::Input('y') | AppAction::Input('Y') => {
                if let Some(mutation) = self.state.dashboard.confirm_delete() {
                    self.spawn_mutation(mutation);
                }
            }
            AppAction::Cancel | AppAction::Input('n') | AppAction::Input('N') => {
                if !self.state.dashboard.deleting {
                    self.state.dashboard.dismiss_delete();
                }
            }
            _ => {}
        }
    }

    fn handle_form_action(&mut self, action: AppAction) {
        let categories = self.state.categories();
        let dashboard = &mut self.state.dashboard;
        match (action, dashboard.field) {
            (AppAction::Left, FormField::Category) => dashboard.cycle_category(&categories, false),
            (AppAction::Right, FormField::Category) | (AppAction::Input(' '), FormField::Category) => {
                dashboard.cycle_category(&categories, true)
            }
            (AppAction::Left | AppAction::Right, FormField::Kind) => dashboard.input(' '),
            (AppAction::Input(ch), _) => dashboard.input(ch),
            (AppAction::Backspace, _) => dashboard.backspace(),
            (AppAction::NextField | AppAction::Down, _) => dashboard.next_field(),
            (AppAction::PrevField | AppAction::Up, _) => dashboard.prev_field(),
            (AppAction::Cancel, _) => {
                if dashboard.form.is_edit() {
                    dashboard.cancel_edit();
                } else {
                    dashboard.focus = Focus::List;
                }
            }
            (AppAction::Submit, _) => {
                if dashboard.saving {
                    return;
                }
                match dashboard.submit() {
                    Ok(mutation) => self.spawn_mutation(mutation),
                    Err(err) => self.toast(ToastLevel::Error, err.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_list_action(&mut self, action: AppAction) {
        let period = self.state.dashboard.period;
        let len = self.state.cache.transactions(period).map_or(0, |items| items.len());
        match action {
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Left | AppAction::Input('[') => {
                self.state.dashboard.prev_period();
            }
            AppAction::Right | AppAction::Input(']') => {
                self.state.dashboard.next_period();
            }
            AppAction::Down | AppAction::Input('j') => self.state.dashboard.select_next(len),
            AppAction::Up | AppAction::Input('k') => self.state.dashboard.select_prev(),
            AppAction::NextField | AppAction::Input('a') => {
                self.state.dashboard.focus = Focus::Form;
            }
            AppAction::Input('e') | AppAction::Submit => {
                if let Some(tx) = self.selected_transaction().cloned() {
                    if !self.state.dashboard.begin_edit(&tx) {
                        self.toast(ToastLevel::Info, "Wait for the current save to finish");
                    }
                }
            }
            AppAction::Input('d') => {
                if let Some(id) = self.selected_transaction().map(|tx| tx.resolved_id()) {
                    self.state.dashboard.request_delete(id);
                }
            }
            AppAction::Input('r') => {
                self.state.cache.invalidate_period(period);
                self.state.cache.invalidate(QueryKey::categories());
            }
            AppAction::Input('x') => self.logout(),
            _ => {}
        }
    }

    fn selected_transaction(&self) -> Option<&api_types::transaction::Transaction> {
        let dashboard = &self.state.dashboard;
        self.state
            .cache
            .transactions(dashboard.period)
            .and_then(|items| items.get(dashboard.selected))
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Fetched { ticket, result } => {
                let key = ticket.key();
                if self.state.cache.complete(ticket, result)
                    && key.resource == Resource::Transactions
                    && key.period == Some(self.state.dashboard.period)
                {
                    let len = self.state.cache.transactions(self.state.dashboard.period).map_or(0, |i| i.len());
                    self.state.dashboard.clamp_selection(len);
                }
            }
            AppEvent::Authenticated { register, result } => match result {
                Ok(token) => self.complete_login(register, token),
                Err(message) => {
                    let message = self.state.login.on_failure(&message);
                    self.toast(ToastLevel::Error, message);
                }
            },
            AppEvent::Mutated {
                kind,
                period,
                result,
            } => match result {
                Ok(()) => {
                    self.state.cache.invalidate_period(period);
                    self.state.dashboard.on_mutation_success(kind);
                    self.toast(ToastLevel::Success, kind.success_message());
                }
                Err(message) => {
                    self.state.dashboard.on_mutation_failure(kind);
                    let message = if message.is_empty() {
                        kind.failure_message().to_string()
                    } else {
                        message
                    };
                    self.toast(ToastLevel::Error, message);
                }
            },
        }
    }

    fn complete_login(&mut self, register: bool, token: String) {
        if let Err(err) = self.session.login(token) {
            let message = self.state.login.on_failure(&err.to_string());
            self.toast(ToastLevel::Error, message);
            return;
        }
        let message = self.state.login.on_success(register);
        self.toast(ToastLevel::Success, message);
        self.state.cache.clear();
        self.navigate(DASHBOARD_PATH);
    }

    pub fn logout(&mut self) {
        if let Err(err) = self.session.logout() {
            tracing::error!("failed to clear session: {err}");
            self.toast(ToastLevel::Error, err.to_string());
            return;
        }
        self.state.cache.clear();
        self.state.dashboard.cancel_edit();
        self.state.dashboard.dismiss_delete();
        self.state.route = self.navigator.revalidate(self.session.is_authenticated());
        self.toast(ToastLevel::Info, "Signed out");
    }

    pub fn navigate(&mut self, path: &str) {
        self.state.route = self
            .navigator
            .navigate(path, self.session.is_authenticated());
    }

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.state.toast = Some(ToastState::new(level, message));
    }

    fn expire_toast(&mut self, now: Instant) {
        if self.state.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.state.toast = None;
        }
    }

    fn spawn_fetch(&mut self, key: QueryKey) {
        let ticket = self.state.cache.begin(key);
        let client = self.client.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = fetch(&client, key).await.map_err(|err| err.to_string());
            let _ = events.send(AppEvent::Fetched { ticket, result });
        });
    }

    fn spawn_auth(&mut self, request: AuthRequest) {
        let client = self.client.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let (register, result) = match request {
                AuthRequest::Login { email, password } => {
                    (false, client.login(&email, &password).await)
                }
                AuthRequest::Register {
                    email,
                    password,
                    name,
                } => (true, client.register(&email, &password, Some(name.as_str())).await),
            };
            let result = result.map_err(|err| err.to_string());
            let _ = events.send(AppEvent::Authenticated { register, result });
        });
    }

    fn spawn_mutation(&mut self, mutation: Mutation) {
        let period = self.state.dashboard.period;
        let kind = mutation.kind();
        let client = self.client.clone();
        let events = self.events_tx.clone();
        tracing::info!(?kind, %period, "sending mutation");
        tokio::spawn(async move {
            let result = apply(&client, mutation).await.map_err(|err| err.to_string());
            let _ = events.send(AppEvent::Mutated {
                kind,
                period,
                result,
            });
        });
    }
}

async fn fetch(client: &Client, key: QueryKey) -> std::result::Result<QueryData, ClientError> {
    Ok(match key.resource {
        Resource::Summary => QueryData::Summary(client.summary(key.period).await?),
        Resource::Transactions => {
            QueryData::Transactions(client.transactions_list(key.period).await?)
        }
        Resource::Categories => QueryData::Categories(client.categories().await?),
    })
}

async fn apply(client: &Client, mutation: Mutation) -> std::result::Result<(), ClientError> {
    match mutation {
        Mutation::Create(input) => client.transaction_create(&input).await.map(|_| ()),
        Mutation::Update { id, input } => client.transaction_update(&id, &input).await.map(|_| ()),
        Mutation::Delete { id } => client.transaction_delete(&id).await.map(|_| ()),
    }
}
